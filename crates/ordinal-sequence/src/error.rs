//! Error types for sequence allocation.

use ordinal_core::CounterStoreError;
use snafu::Snafu;

/// Errors from configuring counters or allocating sequence values.
///
/// Every variant names the `(owner, field)` it concerns. None of them leave a
/// counter row partially updated, so retrying the failed save is always safe.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum SequenceError {
    /// No allocator was configured for this counter.
    #[snafu(display("no sequence configured for '{owner}.{field}'"))]
    NotConfigured {
        /// Owning collection.
        owner: String,
        /// Sequenced field.
        field: String,
    },

    /// The configuration was rejected.
    #[snafu(display("invalid sequence configuration for '{owner}.{field}': {reason}"))]
    InvalidConfiguration {
        /// Owning collection.
        owner: String,
        /// Sequenced field.
        field: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The counter row did not appear within the readiness bound.
    #[snafu(display("counter '{owner}.{field}' not found after waiting {waited_ms}ms"))]
    CounterNotFound {
        /// Owning collection.
        owner: String,
        /// Sequenced field.
        field: String,
        /// How long the caller waited before giving up.
        waited_ms: u64,
    },

    /// Bootstrap hit a store error other than the duplicate-row race.
    #[snafu(display("bootstrap of counter '{owner}.{field}' failed: {source}"))]
    BootstrapFailed {
        /// Owning collection.
        owner: String,
        /// Sequenced field.
        field: String,
        /// The store error that stopped bootstrap.
        source: CounterStoreError,
    },

    /// The counter store failed or could not be reached.
    #[snafu(display("counter store unavailable for '{owner}.{field}': {source}"))]
    StoreUnavailable {
        /// Owning collection.
        owner: String,
        /// Sequenced field.
        field: String,
        /// The underlying store error.
        source: CounterStoreError,
    },

    /// The record already holds a number in the field that is not a usable
    /// sequence value; it is neither kept as-is nor overwritten.
    #[snafu(display("field '{owner}.{field}' holds {value}, which is not an i64 sequence value"))]
    UnusableValue {
        /// Owning collection.
        owner: String,
        /// Sequenced field.
        field: String,
        /// The value found in the record.
        value: String,
    },

    /// The next value does not fit in an i64.
    #[snafu(display("sequence exhausted for '{owner}.{field}'"))]
    SequenceExhausted {
        /// Owning collection.
        owner: String,
        /// Sequenced field.
        field: String,
    },
}

impl SequenceError {
    /// Build the error for a store failure observed while allocating.
    pub(crate) fn from_store(owner: &str, field: &str, source: CounterStoreError) -> Self {
        match source {
            CounterStoreError::Overflow { .. } => SequenceError::SequenceExhausted {
                owner: owner.to_string(),
                field: field.to_string(),
            },
            source => SequenceError::StoreUnavailable {
                owner: owner.to_string(),
                field: field.to_string(),
                source,
            },
        }
    }
}
