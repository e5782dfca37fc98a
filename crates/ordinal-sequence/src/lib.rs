//! Sequence allocation for ordinal.
//!
//! Assigns unique, monotonically advancing integers to a numeric field of
//! newly created records. Each `(owner, field)` pair has one durable counter
//! row; values are taken from it with the store's atomic increment, so they
//! stay unique across tasks and processes sharing the store.
//!
//! # Key Components
//!
//! - [`SequenceAllocator`]: `consume_next` / `peek_next` over a [`CounterStore`](ordinal_core::CounterStore)
//! - [`CounterRegistry`]: configuration, bootstrap and [`Readiness`]
//! - [`AssignmentHook`] / [`SequencedModel`]: number records before they are persisted
//! - [`ArbitratedCounterStore`]: atomic increments over a plain [`CounterTable`](ordinal_core::CounterTable)
//! - [`SequenceSettings`]: readiness bounds and storage naming, from TOML and environment
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use ordinal_core::InMemoryCounterStore;
//! use ordinal_sequence::{SequenceAllocator, SequenceConfig};
//!
//! let allocator = SequenceAllocator::with_default_settings(InMemoryCounterStore::new());
//! allocator.configure_and_wait(SequenceConfig::for_owner("Book")).await?;
//! assert_eq!(allocator.consume_next("Book", "_id").await?, 0);
//! assert_eq!(allocator.peek_next("Book", "_id").await?, 1);
//! ```

pub mod allocator;
pub mod arbiter;
pub mod config;
pub mod document;
pub mod error;
pub mod hook;
pub mod model;
pub mod registry;
pub mod settings;

pub use allocator::SequenceAllocator;
pub use arbiter::ArbitratedCounterStore;
pub use config::SequenceConfig;
pub use document::Document;
pub use error::SequenceError;
pub use hook::Assignment;
pub use hook::AssignmentHook;
pub use hook::RecordWriter;
pub use hook::SaveError;
pub use hook::SequencedRecord;
pub use model::RecordSequenceExt;
pub use model::SequencedModel;
pub use registry::CounterRegistry;
pub use registry::Readiness;
pub use settings::ConfigError;
pub use settings::SequenceSettings;
