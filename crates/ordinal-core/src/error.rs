//! Errors returned by counter stores.

use thiserror::Error;

/// Errors returned by a [`CounterStore`](crate::CounterStore) or
/// [`CounterTable`](crate::CounterTable).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CounterStoreError {
    /// No row exists for the counter yet.
    #[error("counter '{owner}.{field}' not found")]
    NotFound { owner: String, field: String },

    /// A row for the counter already exists (lost an initialization race).
    #[error("counter '{owner}.{field}' already exists")]
    DuplicateCounter { owner: String, field: String },

    /// Applying the increment would overflow the counter.
    #[error("counter '{owner}.{field}' overflows: {count} + {delta}")]
    Overflow {
        owner: String,
        field: String,
        count: i64,
        delta: i64,
    },

    /// The stored row could not be decoded.
    #[error("corrupted counter '{owner}.{field}': {reason}")]
    CorruptedData {
        owner: String,
        field: String,
        reason: String,
    },

    /// The backing database could not be reached or failed the operation.
    #[error("counter store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl CounterStoreError {
    /// True for the duplicate-row race that bootstrap treats as success.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, CounterStoreError::DuplicateCounter { .. })
    }

    /// True when the counter row does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CounterStoreError::NotFound { .. })
    }
}
