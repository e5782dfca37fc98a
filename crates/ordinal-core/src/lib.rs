//! Core types and traits for ordinal sequence allocation.
//!
//! This crate provides the pieces shared by every counter backend and by the
//! allocator itself. Storage crates depend on it without pulling in the
//! allocator.
//!
//! # Key Components
//!
//! - **Types**: [`CounterKey`], [`Counter`]
//! - **Traits**: [`CounterStore`] (atomic increment), [`CounterTable`] (plain rows)
//! - **Errors**: [`CounterStoreError`]
//! - **Stores**: [`InMemoryCounterStore`]
//! - **Constants**: fixed limits and defaults, checked at compile time

pub mod constants;
pub mod counter;
pub mod error;
pub mod inmemory;
pub mod traits;
pub mod verified;

pub use constants::DEFAULT_COUNTER_COLLECTION;
pub use constants::DEFAULT_INCREMENT;
pub use constants::DEFAULT_SEQUENCE_FIELD;
pub use constants::DEFAULT_START_VALUE;
pub use constants::MAX_NAME_LENGTH;
pub use counter::Counter;
pub use counter::CounterKey;
pub use error::CounterStoreError;
pub use inmemory::InMemoryCounterStore;
pub use traits::CounterStore;
pub use traits::CounterTable;
