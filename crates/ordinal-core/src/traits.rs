//! Store interfaces used by the sequence allocator.
//!
//! [`CounterStore`] is the interface the allocator runs against. Backends that
//! cannot increment atomically implement the plainer [`CounterTable`] and are
//! wrapped by an arbiter that serializes increments in-process.

use async_trait::async_trait;

use crate::counter::Counter;
use crate::counter::CounterKey;
use crate::error::CounterStoreError;

/// Durable counter rows with an atomic increment primitive.
///
/// Implementations must enforce uniqueness of `(owner, field)`.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read the row for `key`, if any. No side effects.
    async fn find_counter(&self, key: &CounterKey) -> Result<Option<Counter>, CounterStoreError>;

    /// Insert a row with `count = initial_count`.
    ///
    /// Returns [`CounterStoreError::DuplicateCounter`] when a row for `key`
    /// already exists; the existing row is left untouched.
    async fn create_counter_if_absent(&self, key: &CounterKey, initial_count: i64) -> Result<(), CounterStoreError>;

    /// Atomically apply `count += delta` and return the row after the update.
    ///
    /// This must be a single indivisible store operation. Returns
    /// [`CounterStoreError::NotFound`] if the row does not exist and
    /// [`CounterStoreError::Overflow`] (without mutating) if the result does
    /// not fit.
    async fn increment_and_fetch(&self, key: &CounterKey, delta: i64) -> Result<Counter, CounterStoreError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: CounterStore + ?Sized> CounterStore for std::sync::Arc<T> {
    async fn find_counter(&self, key: &CounterKey) -> Result<Option<Counter>, CounterStoreError> {
        (**self).find_counter(key).await
    }

    async fn create_counter_if_absent(&self, key: &CounterKey, initial_count: i64) -> Result<(), CounterStoreError> {
        (**self).create_counter_if_absent(key, initial_count).await
    }

    async fn increment_and_fetch(&self, key: &CounterKey, delta: i64) -> Result<Counter, CounterStoreError> {
        (**self).increment_and_fetch(key, delta).await
    }
}

/// Counter rows without an atomic update primitive.
///
/// Reads and writes are individually durable but a read followed by a write
/// is not atomic, so callers must serialize updates of a row themselves.
#[async_trait]
pub trait CounterTable: Send + Sync {
    /// Read the row for `key`, if any.
    async fn get_row(&self, key: &CounterKey) -> Result<Option<Counter>, CounterStoreError>;

    /// Insert a new row, failing with `DuplicateCounter` if one exists.
    async fn insert_row(&self, row: Counter) -> Result<(), CounterStoreError>;

    /// Overwrite an existing row, failing with `NotFound` if none exists.
    async fn put_row(&self, row: Counter) -> Result<(), CounterStoreError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: CounterTable + ?Sized> CounterTable for std::sync::Arc<T> {
    async fn get_row(&self, key: &CounterKey) -> Result<Option<Counter>, CounterStoreError> {
        (**self).get_row(key).await
    }

    async fn insert_row(&self, row: Counter) -> Result<(), CounterStoreError> {
        (**self).insert_row(row).await
    }

    async fn put_row(&self, row: Counter) -> Result<(), CounterStoreError> {
        (**self).put_row(row).await
    }
}
