//! Persistent, race-free sequence allocation.
//!
//! Facade over the ordinal workspace crates:
//!
//! - [`counters`]: counter types, store traits, in-memory store
//! - [`storage`]: durable redb counter store
//! - [`sequence`]: allocator, registry, hooks and settings
//!
//! The most common types are re-exported at the crate root.

use std::path::Path;
use std::sync::Arc;

use snafu::ResultExt;
use snafu::Snafu;

pub use ordinal_core as counters;
pub use ordinal_redb_storage as storage;
pub use ordinal_sequence as sequence;

pub use ordinal_core::Counter;
pub use ordinal_core::CounterKey;
pub use ordinal_core::CounterStore;
pub use ordinal_core::CounterStoreError;
pub use ordinal_core::CounterTable;
pub use ordinal_core::InMemoryCounterStore;
pub use ordinal_redb_storage::RedbCounterStore;
pub use ordinal_redb_storage::RedbStoreError;
pub use ordinal_sequence::ArbitratedCounterStore;
pub use ordinal_sequence::Assignment;
pub use ordinal_sequence::AssignmentHook;
pub use ordinal_sequence::ConfigError;
pub use ordinal_sequence::Document;
pub use ordinal_sequence::Readiness;
pub use ordinal_sequence::RecordSequenceExt;
pub use ordinal_sequence::RecordWriter;
pub use ordinal_sequence::SaveError;
pub use ordinal_sequence::SequenceAllocator;
pub use ordinal_sequence::SequenceConfig;
pub use ordinal_sequence::SequenceError;
pub use ordinal_sequence::SequenceSettings;
pub use ordinal_sequence::SequencedModel;
pub use ordinal_sequence::SequencedRecord;

/// Failure to build a persistent allocator.
#[derive(Debug, Snafu)]
pub enum OpenError {
    #[snafu(display("invalid sequence settings: {source}"))]
    InvalidSettings { source: ConfigError },

    #[snafu(display("failed to open counter store: {source}"))]
    Storage { source: RedbStoreError },
}

/// Open (or create) a redb counter database at `path` and build an allocator on it.
///
/// `settings` are validated before anything touches the disk. Counter rows go
/// into the table named by `settings.counter_collection`.
pub fn open_persistent(
    path: impl AsRef<Path>,
    settings: SequenceSettings,
) -> Result<SequenceAllocator<RedbCounterStore>, OpenError> {
    settings.validate().context(InvalidSettingsSnafu)?;
    let store = RedbCounterStore::open(path, &settings.counter_collection).context(StorageSnafu)?;
    Ok(SequenceAllocator::new(Arc::new(store), settings))
}

/// Build an allocator on a fresh in-memory store.
pub fn in_memory(settings: SequenceSettings) -> Result<SequenceAllocator<InMemoryCounterStore>, ConfigError> {
    SequenceAllocator::try_new(InMemoryCounterStore::new(), settings)
}
