//! Counter stores with scripted failures.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use ordinal::Counter;
use ordinal::CounterKey;
use ordinal::CounterStore;
use ordinal::CounterStoreError;
use ordinal::InMemoryCounterStore;

fn unreachable() -> CounterStoreError {
    CounterStoreError::Unavailable {
        reason: "connection refused".to_string(),
    }
}

/// Wraps an in-memory store; while offline every call fails as unavailable.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryCounterStore,
    offline: AtomicBool,
}

impl FlakyStore {
    pub fn offline() -> Self {
        let store = Self::default();
        store.set_offline(true);
        store
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CounterStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(unreachable());
        }
        Ok(())
    }
}

#[async_trait]
impl CounterStore for FlakyStore {
    async fn find_counter(&self, key: &CounterKey) -> Result<Option<Counter>, CounterStoreError> {
        self.check()?;
        self.inner.find_counter(key).await
    }

    async fn create_counter_if_absent(&self, key: &CounterKey, initial_count: i64) -> Result<(), CounterStoreError> {
        self.check()?;
        self.inner.create_counter_if_absent(key, initial_count).await
    }

    async fn increment_and_fetch(&self, key: &CounterKey, delta: i64) -> Result<Counter, CounterStoreError> {
        self.check()?;
        self.inner.increment_and_fetch(key, delta).await
    }
}
