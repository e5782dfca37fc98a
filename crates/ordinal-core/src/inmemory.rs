//! In-memory counter store.
//!
//! Deterministic and thread-safe; suitable for tests and single-process use
//! where counters need not outlive the process.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::counter::Counter;
use crate::counter::CounterKey;
use crate::error::CounterStoreError;
use crate::traits::CounterStore;
use crate::traits::CounterTable;
use crate::verified::compute_incremented_count;

/// A deterministic in-memory counter store.
///
/// Increments run under the write lock, which makes `increment_and_fetch`
/// atomic with respect to every other operation on the store.
#[derive(Default)]
pub struct InMemoryCounterStore {
    rows: RwLock<BTreeMap<CounterKey, i64>>,
}

impl InMemoryCounterStore {
    /// Create a new store wrapped in Arc.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All rows, ordered by key.
    pub async fn counters(&self) -> Vec<Counter> {
        let rows = self.rows.read().await;
        rows.iter().map(|(key, count)| Counter::new(key, *count)).collect()
    }
}

fn not_found(key: &CounterKey) -> CounterStoreError {
    CounterStoreError::NotFound {
        owner: key.owner.clone(),
        field: key.field.clone(),
    }
}

fn duplicate(key: &CounterKey) -> CounterStoreError {
    CounterStoreError::DuplicateCounter {
        owner: key.owner.clone(),
        field: key.field.clone(),
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn find_counter(&self, key: &CounterKey) -> Result<Option<Counter>, CounterStoreError> {
        let rows = self.rows.read().await;
        Ok(rows.get(key).map(|count| Counter::new(key, *count)))
    }

    async fn create_counter_if_absent(&self, key: &CounterKey, initial_count: i64) -> Result<(), CounterStoreError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(key) {
            return Err(duplicate(key));
        }
        rows.insert(key.clone(), initial_count);
        Ok(())
    }

    async fn increment_and_fetch(&self, key: &CounterKey, delta: i64) -> Result<Counter, CounterStoreError> {
        let mut rows = self.rows.write().await;
        let count = rows.get_mut(key).ok_or_else(|| not_found(key))?;
        let updated = compute_incremented_count(*count, delta).ok_or_else(|| CounterStoreError::Overflow {
            owner: key.owner.clone(),
            field: key.field.clone(),
            count: *count,
            delta,
        })?;
        *count = updated;
        Ok(Counter::new(key, updated))
    }
}

#[async_trait]
impl CounterTable for InMemoryCounterStore {
    async fn get_row(&self, key: &CounterKey) -> Result<Option<Counter>, CounterStoreError> {
        self.find_counter(key).await
    }

    async fn insert_row(&self, row: Counter) -> Result<(), CounterStoreError> {
        self.create_counter_if_absent(&row.key(), row.count).await
    }

    async fn put_row(&self, row: Counter) -> Result<(), CounterStoreError> {
        let key = row.key();
        let mut rows = self.rows.write().await;
        match rows.get_mut(&key) {
            Some(count) => {
                *count = row.count;
                Ok(())
            }
            None => Err(not_found(&key)),
        }
    }
}
