//! Counter registry: configuration, bootstrap and readiness.
//!
//! Each configured `(owner, field)` has one entry holding its
//! [`SequenceConfig`] and a watch channel publishing its [`Readiness`].
//! Bootstrap makes sure the counter row exists and flips the entry to
//! `Ready`; consumers wait on the channel instead of polling a flag.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ordinal_core::CounterKey;
use ordinal_core::CounterStore;
use ordinal_core::CounterStoreError;
use tokio::sync::RwLock;
use tokio::sync::watch;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::SequenceConfig;
use crate::error::CounterNotFoundSnafu;
use crate::error::InvalidConfigurationSnafu;
use crate::error::NotConfiguredSnafu;
use crate::error::SequenceError;

/// Bootstrap state of one counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Registered; the counter row may not exist yet.
    Bootstrapping,
    /// The counter row is known to exist.
    Ready,
    /// The last bootstrap attempt failed with this store error.
    Failed(CounterStoreError),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    fn is_settled(&self) -> bool {
        !matches!(self, Readiness::Bootstrapping)
    }
}

struct CounterEntry {
    config: SequenceConfig,
    state: watch::Sender<Readiness>,
}

/// Tracks configured counters and brings their rows into existence.
pub struct CounterRegistry<S: CounterStore + ?Sized> {
    store: Arc<S>,
    entries: RwLock<HashMap<CounterKey, Arc<CounterEntry>>>,
}

impl<S: CounterStore + ?Sized> CounterRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Record `config` for its counter.
    ///
    /// Returns `true` when the caller should run [`bootstrap`](Self::bootstrap):
    /// the counter is new, or its previous bootstrap failed. Registering the
    /// same configuration again is a no-op; registering a different start or
    /// step for an existing counter is rejected.
    pub async fn register(&self, config: SequenceConfig) -> Result<bool, SequenceError> {
        config.validate()?;
        let key = config.key();

        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(&key) {
            if !existing.config.is_compatible_with(&config) {
                return InvalidConfigurationSnafu {
                    owner: config.owner,
                    field: config.field,
                    reason: format!(
                        "already configured with start value {} and increment {}",
                        existing.config.start_value, existing.config.increment
                    ),
                }
                .fail();
            }

            let failed = matches!(*existing.state.borrow(), Readiness::Failed(_));
            if failed {
                existing.state.send_replace(Readiness::Bootstrapping);
            }
            return Ok(failed);
        }

        debug!(counter = %key, start = config.start_value, increment = config.increment, "registering counter");
        let (state, _) = watch::channel(Readiness::Bootstrapping);
        entries.insert(key, Arc::new(CounterEntry { config, state }));
        Ok(true)
    }

    /// Configuration registered for `key`.
    pub async fn config(&self, key: &CounterKey) -> Result<SequenceConfig, SequenceError> {
        Ok(self.entry(key).await?.config.clone())
    }

    /// Current readiness of `key`.
    pub async fn readiness(&self, key: &CounterKey) -> Result<Readiness, SequenceError> {
        let entry = self.entry(key).await?;
        let state = entry.state.borrow().clone();
        Ok(state)
    }

    /// Configurations of every registered counter of `owner`, ordered by field.
    pub async fn configs_for_owner(&self, owner: &str) -> Vec<SequenceConfig> {
        let entries = self.entries.read().await;
        let mut configs: Vec<SequenceConfig> =
            entries.values().filter(|entry| entry.config.owner == owner).map(|entry| entry.config.clone()).collect();
        configs.sort_by(|a, b| a.field.cmp(&b.field));
        configs
    }

    /// Ensure the counter row for `key` exists, then mark it ready.
    ///
    /// An existing row is never modified. Losing the creation race to another
    /// process surfaces as a duplicate-row error from the store, which means
    /// the row now exists and is treated as success. Any other store error
    /// marks the counter failed.
    pub async fn bootstrap(&self, key: &CounterKey) -> Result<(), SequenceError> {
        let entry = self.entry(key).await?;

        match self.store.find_counter(key).await {
            Ok(Some(counter)) => {
                debug!(counter = %key, count = counter.count, "counter row already present");
                entry.state.send_replace(Readiness::Ready);
                return Ok(());
            }
            Ok(None) => {}
            Err(source) => return Err(mark_failed(&entry, source)),
        }

        let Some(initial_count) = entry.config.initial_count() else {
            return InvalidConfigurationSnafu {
                owner: key.owner.clone(),
                field: key.field.clone(),
                reason: "initial count overflows".to_string(),
            }
            .fail();
        };

        match self.store.create_counter_if_absent(key, initial_count).await {
            Ok(()) => info!(counter = %key, initial_count, "created counter row"),
            Err(e) if e.is_duplicate() => warn!(counter = %key, "lost counter creation race, using existing row"),
            Err(source) => return Err(mark_failed(&entry, source)),
        }

        entry.state.send_replace(Readiness::Ready);
        Ok(())
    }

    /// Wait up to `timeout` for `key` to leave the bootstrapping state.
    ///
    /// Returns immediately if the counter is already ready. Fails with
    /// `BootstrapFailed` if bootstrap failed and `CounterNotFound` if the
    /// bound elapses first.
    pub async fn wait_ready(&self, key: &CounterKey, timeout: Duration) -> Result<(), SequenceError> {
        let entry = self.entry(key).await?;
        let mut rx = entry.state.subscribe();

        let settled = tokio::time::timeout(timeout, async {
            rx.wait_for(Readiness::is_settled).await.map(|state| state.clone())
        })
        .await;

        match settled {
            Ok(Ok(Readiness::Ready)) => Ok(()),
            Ok(Ok(Readiness::Failed(source))) => Err(SequenceError::BootstrapFailed {
                owner: key.owner.clone(),
                field: key.field.clone(),
                source,
            }),
            Ok(Ok(Readiness::Bootstrapping)) | Ok(Err(_)) | Err(_) => CounterNotFoundSnafu {
                owner: key.owner.clone(),
                field: key.field.clone(),
                waited_ms: timeout.as_millis() as u64,
            }
            .fail(),
        }
    }

    async fn entry(&self, key: &CounterKey) -> Result<Arc<CounterEntry>, SequenceError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) => Ok(Arc::clone(entry)),
            None => NotConfiguredSnafu {
                owner: key.owner.clone(),
                field: key.field.clone(),
            }
            .fail(),
        }
    }
}

fn mark_failed(entry: &CounterEntry, source: CounterStoreError) -> SequenceError {
    let key = entry.config.key();
    warn!(counter = %key, error = %source, "counter bootstrap failed");
    entry.state.send_replace(Readiness::Failed(source.clone()));
    SequenceError::BootstrapFailed {
        owner: key.owner,
        field: key.field,
        source,
    }
}
