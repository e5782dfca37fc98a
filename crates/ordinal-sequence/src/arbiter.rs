//! Single-owner increments for stores without an atomic update.
//!
//! [`ArbitratedCounterStore`] turns any [`CounterTable`] into a
//! [`CounterStore`]. Every counter gets one owning task that applies its
//! increments one at a time; callers send a request over a bounded channel
//! and wait for the reply. Because only that task ever writes the row, the
//! read-modify-write it performs cannot interleave with another increment
//! of the same counter in this process.
//!
//! This serializes increments within one process only. Several processes
//! sharing a table need a backend that implements [`CounterStore`] natively.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ordinal_core::Counter;
use ordinal_core::CounterKey;
use ordinal_core::CounterStore;
use ordinal_core::CounterStoreError;
use ordinal_core::CounterTable;
use ordinal_core::constants::DEFAULT_ARBITER_QUEUE_DEPTH;
use ordinal_core::verified::compute_incremented_count;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::debug;

use crate::settings::SequenceSettings;

struct IncrementRequest {
    delta: i64,
    reply: oneshot::Sender<Result<Counter, CounterStoreError>>,
}

/// A [`CounterStore`] over a plain [`CounterTable`].
pub struct ArbitratedCounterStore<T: CounterTable + ?Sized + 'static> {
    table: Arc<T>,
    arbiters: Mutex<HashMap<CounterKey, mpsc::Sender<IncrementRequest>>>,
    queue_depth: usize,
}

impl<T: CounterTable + ?Sized + 'static> ArbitratedCounterStore<T> {
    pub fn new(table: Arc<T>) -> Self {
        Self::with_queue_depth(table, DEFAULT_ARBITER_QUEUE_DEPTH)
    }

    /// `queue_depth` bounds the increments buffered per counter; senders
    /// beyond it wait for room.
    pub fn with_queue_depth(table: Arc<T>, queue_depth: u32) -> Self {
        Self {
            table,
            arbiters: Mutex::new(HashMap::new()),
            queue_depth: queue_depth.max(1) as usize,
        }
    }

    pub fn from_settings(table: Arc<T>, settings: &SequenceSettings) -> Self {
        Self::with_queue_depth(table, settings.arbiter_queue_depth)
    }

    pub fn table(&self) -> &Arc<T> {
        &self.table
    }

    async fn arbiter_for(&self, key: &CounterKey) -> mpsc::Sender<IncrementRequest> {
        let mut arbiters = self.arbiters.lock().await;
        if let Some(tx) = arbiters.get(key) {
            if !tx.is_closed() {
                return tx.clone();
            }
        }

        let (tx, rx) = mpsc::channel(self.queue_depth);
        tokio::spawn(run_arbiter(Arc::clone(&self.table), key.clone(), rx));
        arbiters.insert(key.clone(), tx.clone());
        tx
    }
}

async fn run_arbiter<T: CounterTable + ?Sized>(
    table: Arc<T>,
    key: CounterKey,
    mut requests: mpsc::Receiver<IncrementRequest>,
) {
    debug!(counter = %key, "counter arbiter started");
    while let Some(request) = requests.recv().await {
        let result = apply_increment(table.as_ref(), &key, request.delta).await;
        // The caller may have gone away; the increment still stands.
        let _ = request.reply.send(result);
    }
    debug!(counter = %key, "counter arbiter stopped");
}

async fn apply_increment<T: CounterTable + ?Sized>(
    table: &T,
    key: &CounterKey,
    delta: i64,
) -> Result<Counter, CounterStoreError> {
    let current = table.get_row(key).await?.ok_or_else(|| CounterStoreError::NotFound {
        owner: key.owner.clone(),
        field: key.field.clone(),
    })?;
    let count = compute_incremented_count(current.count, delta).ok_or_else(|| CounterStoreError::Overflow {
        owner: key.owner.clone(),
        field: key.field.clone(),
        count: current.count,
        delta,
    })?;

    let updated = Counter::new(key, count);
    table.put_row(updated.clone()).await?;
    Ok(updated)
}

fn arbiter_gone() -> CounterStoreError {
    CounterStoreError::Unavailable {
        reason: "counter arbiter stopped".to_string(),
    }
}

#[async_trait]
impl<T: CounterTable + ?Sized + 'static> CounterStore for ArbitratedCounterStore<T> {
    async fn find_counter(&self, key: &CounterKey) -> Result<Option<Counter>, CounterStoreError> {
        self.table.get_row(key).await
    }

    async fn create_counter_if_absent(&self, key: &CounterKey, initial_count: i64) -> Result<(), CounterStoreError> {
        self.table.insert_row(Counter::new(key, initial_count)).await
    }

    async fn increment_and_fetch(&self, key: &CounterKey, delta: i64) -> Result<Counter, CounterStoreError> {
        let (reply, response) = oneshot::channel();
        let arbiter = self.arbiter_for(key).await;
        arbiter.send(IncrementRequest { delta, reply }).await.map_err(|_| arbiter_gone())?;
        response.await.map_err(|_| arbiter_gone())?
    }
}
