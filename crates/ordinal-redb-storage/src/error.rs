//! Errors raised by the redb counter store.

use std::path::PathBuf;

use ordinal_core::CounterKey;
use ordinal_core::CounterStoreError;
use snafu::Snafu;

/// Redb counter store errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RedbStoreError {
    #[snafu(display("failed to create directory {}: {source}", path.display()))]
    CreateDirectory { path: PathBuf, source: std::io::Error },

    #[snafu(display("failed to open database at {}: {source}", path.display()))]
    OpenDatabase {
        path: PathBuf,
        #[snafu(source(from(redb::DatabaseError, Box::new)))]
        source: Box<redb::DatabaseError>,
    },

    #[snafu(display("failed to begin write transaction: {source}"))]
    BeginWrite {
        #[snafu(source(from(redb::TransactionError, Box::new)))]
        source: Box<redb::TransactionError>,
    },

    #[snafu(display("failed to begin read transaction: {source}"))]
    BeginRead {
        #[snafu(source(from(redb::TransactionError, Box::new)))]
        source: Box<redb::TransactionError>,
    },

    #[snafu(display("failed to open table '{table}': {source}"))]
    OpenTable {
        table: String,
        #[snafu(source(from(redb::TableError, Box::new)))]
        source: Box<redb::TableError>,
    },

    #[snafu(display("failed to commit transaction: {source}"))]
    Commit {
        #[snafu(source(from(redb::CommitError, Box::new)))]
        source: Box<redb::CommitError>,
    },

    #[snafu(display("failed to insert into table: {source}"))]
    Insert {
        #[snafu(source(from(redb::StorageError, Box::new)))]
        source: Box<redb::StorageError>,
    },

    #[snafu(display("failed to get from table: {source}"))]
    Get {
        #[snafu(source(from(redb::StorageError, Box::new)))]
        source: Box<redb::StorageError>,
    },

    #[snafu(display("failed to iterate table: {source}"))]
    Iterator {
        #[snafu(source(from(redb::StorageError, Box::new)))]
        source: Box<redb::StorageError>,
    },

    #[snafu(display("failed to serialize counter {key}: {source}"))]
    Serialize {
        key: CounterKey,
        #[snafu(source(from(bincode::Error, Box::new)))]
        source: Box<bincode::Error>,
    },

    #[snafu(display("failed to deserialize counter {key}: {source}"))]
    Deserialize {
        key: CounterKey,
        #[snafu(source(from(bincode::Error, Box::new)))]
        source: Box<bincode::Error>,
    },

    #[snafu(display("blocking storage task failed: {source}"))]
    BlockingTask { source: tokio::task::JoinError },

    #[snafu(display("counter {key} not found"))]
    CounterNotFound { key: CounterKey },

    #[snafu(display("counter {key} already exists"))]
    CounterExists { key: CounterKey },

    #[snafu(display("counter {key} overflows: {count} + {delta}"))]
    CounterOverflow { key: CounterKey, count: i64, delta: i64 },
}

impl From<RedbStoreError> for CounterStoreError {
    fn from(err: RedbStoreError) -> Self {
        match err {
            RedbStoreError::CounterNotFound { key } => CounterStoreError::NotFound {
                owner: key.owner,
                field: key.field,
            },
            RedbStoreError::CounterExists { key } => CounterStoreError::DuplicateCounter {
                owner: key.owner,
                field: key.field,
            },
            RedbStoreError::CounterOverflow { key, count, delta } => CounterStoreError::Overflow {
                owner: key.owner,
                field: key.field,
                count,
                delta,
            },
            RedbStoreError::Deserialize { key, source } => CounterStoreError::CorruptedData {
                owner: key.owner,
                field: key.field,
                reason: source.to_string(),
            },
            other => CounterStoreError::Unavailable {
                reason: other.to_string(),
            },
        }
    }
}
