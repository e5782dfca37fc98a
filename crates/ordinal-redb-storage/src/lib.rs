//! Redb-based counter store for ordinal.
//!
//! Counter rows live in a single reserved redb table keyed by
//! `(owner, field)`, so counters survive process restarts and the table's
//! primary key enforces one row per counter.
//!
//! # Example
//!
//! ```ignore
//! use ordinal_core::{CounterKey, CounterStore};
//! use ordinal_redb_storage::RedbCounterStore;
//!
//! let store = RedbCounterStore::open("./data/counters.redb", "__ordinal_counters")?;
//! let key = CounterKey::new("Book", "_id");
//! store.create_counter_if_absent(&key, -1).await?;
//! assert_eq!(store.increment_and_fetch(&key, 1).await?.count, 0);
//! ```

mod error;
mod store;

pub use error::RedbStoreError;
pub use store::RedbCounterStore;
