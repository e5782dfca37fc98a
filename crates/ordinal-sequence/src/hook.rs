//! Record assignment hook.
//!
//! Runs just before a new record is persisted. If the record has no numeric
//! value in the sequenced field, the hook consumes the next value from the
//! allocator and writes it into the record; a value the caller already set
//! is left alone and nothing is consumed. A number the record cannot express
//! as an i64 is rejected rather than replaced. When allocation fails the
//! record is not persisted.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ordinal_core::CounterKey;
use ordinal_core::CounterStore;
use tracing::debug;

use crate::allocator::SequenceAllocator;
use crate::error::SequenceError;
use crate::error::UnusableValueSnafu;

/// A record with numeric fields the hook can read and fill in.
pub trait SequencedRecord: Send {
    /// The field's value if it holds a well-formed integer, otherwise `None`.
    fn sequence_value(&self, field: &str) -> Option<i64>;

    /// Overwrite the field with `value`.
    fn set_sequence_value(&mut self, field: &str, value: i64);

    /// A rendering of the field's value when it is a number that
    /// [`sequence_value`](Self::sequence_value) cannot represent, such as a
    /// fractional or out-of-range number. Such a field is never overwritten.
    fn unusable_value(&self, _field: &str) -> Option<String> {
        None
    }
}

/// Where a record's sequenced value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The caller supplied the value; no counter traffic happened.
    AlreadyNumbered(i64),
    /// The value was consumed from the counter.
    Allocated(i64),
}

impl Assignment {
    pub fn value(&self) -> i64 {
        match self {
            Assignment::AlreadyNumbered(value) | Assignment::Allocated(value) => *value,
        }
    }
}

/// Persists records once they are numbered.
#[async_trait]
pub trait RecordWriter<R: Send + Sync>: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn persist(&self, owner: &str, record: &R) -> Result<(), Self::Error>;
}

/// Failure of a hooked save.
#[derive(Debug)]
pub enum SaveError<E> {
    /// No value could be assigned; the record was not persisted.
    Assignment(SequenceError),
    /// The value was assigned but the write failed. The consumed value is
    /// not returned to the counter.
    Persist(E),
}

impl<E: fmt::Display> fmt::Display for SaveError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Assignment(err) => write!(f, "sequence assignment failed: {}", err),
            SaveError::Persist(err) => write!(f, "failed to persist record: {}", err),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for SaveError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Assignment(err) => Some(err),
            SaveError::Persist(err) => Some(err),
        }
    }
}

impl<E> From<SequenceError> for SaveError<E> {
    fn from(err: SequenceError) -> Self {
        SaveError::Assignment(err)
    }
}

/// Pre-persist hook bound to one counter.
pub struct AssignmentHook<S: CounterStore + ?Sized + 'static> {
    allocator: Arc<SequenceAllocator<S>>,
    key: CounterKey,
}

impl<S: CounterStore + ?Sized + 'static> Clone for AssignmentHook<S> {
    fn clone(&self) -> Self {
        Self {
            allocator: Arc::clone(&self.allocator),
            key: self.key.clone(),
        }
    }
}

impl<S: CounterStore + ?Sized + 'static> AssignmentHook<S> {
    pub fn new(allocator: Arc<SequenceAllocator<S>>, key: CounterKey) -> Self {
        Self { allocator, key }
    }

    pub fn key(&self) -> &CounterKey {
        &self.key
    }

    /// Fill in the sequenced field unless the record already has a number there.
    pub async fn before_persist<R: SequencedRecord>(&self, record: &mut R) -> Result<Assignment, SequenceError> {
        if let Some(value) = record.sequence_value(&self.key.field) {
            debug!(counter = %self.key, value, "record already numbered");
            return Ok(Assignment::AlreadyNumbered(value));
        }
        if let Some(value) = record.unusable_value(&self.key.field) {
            return UnusableValueSnafu {
                owner: self.key.owner.as_str(),
                field: self.key.field.as_str(),
                value,
            }
            .fail();
        }

        let value = self.allocator.consume_next(&self.key.owner, &self.key.field).await?;
        record.set_sequence_value(&self.key.field, value);
        Ok(Assignment::Allocated(value))
    }

    /// Number `record`, then hand it to `writer`.
    pub async fn save<R, W>(&self, mut record: R, writer: &W) -> Result<R, SaveError<W::Error>>
    where
        R: SequencedRecord + Sync,
        W: RecordWriter<R> + ?Sized,
    {
        self.before_persist(&mut record).await?;
        writer.persist(&self.key.owner, &record).await.map_err(SaveError::Persist)?;
        Ok(record)
    }
}
