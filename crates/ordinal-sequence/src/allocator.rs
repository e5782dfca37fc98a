//! Sequence allocator.
//!
//! Hands out values from counter rows. Each value comes from a single atomic
//! `increment_and_fetch` on the store, so values are unique across every
//! task and process sharing the store, and no value is handed out twice
//! even when callers fail afterwards (gaps are possible, reuse is not).

use std::sync::Arc;

use ordinal_core::CounterKey;
use ordinal_core::CounterStore;
use ordinal_core::verified::compute_peek_value;
use tokio::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::instrument;
use tracing::warn;

use crate::config::SequenceConfig;
use crate::error::CounterNotFoundSnafu;
use crate::error::SequenceError;
use crate::error::SequenceExhaustedSnafu;
use crate::registry::CounterRegistry;
use crate::registry::Readiness;
use crate::settings::ConfigError;
use crate::settings::SequenceSettings;

/// Allocates sequence values for every counter configured on it.
pub struct SequenceAllocator<S: CounterStore + ?Sized + 'static> {
    registry: Arc<CounterRegistry<S>>,
    settings: SequenceSettings,
}

impl<S: CounterStore + ?Sized + 'static> SequenceAllocator<S> {
    /// Build an allocator without checking `settings`.
    ///
    /// Use [`try_new`](Self::try_new) for settings that did not come from
    /// [`SequenceSettings::load_with_layers`].
    pub fn new(store: Arc<S>, settings: SequenceSettings) -> Self {
        Self {
            registry: Arc::new(CounterRegistry::new(store)),
            settings,
        }
    }

    /// Build an allocator after validating `settings`.
    pub fn try_new(store: Arc<S>, settings: SequenceSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self::new(store, settings))
    }

    pub fn with_default_settings(store: Arc<S>) -> Self {
        Self::new(store, SequenceSettings::default())
    }

    pub fn registry(&self) -> &Arc<CounterRegistry<S>> {
        &self.registry
    }

    pub fn settings(&self) -> &SequenceSettings {
        &self.settings
    }

    /// Register `config` and start bootstrapping its counter in the background.
    ///
    /// Returns as soon as the configuration is recorded. Consumers arriving
    /// before bootstrap completes wait for it, bounded by the readiness
    /// timeout. Must be called from within a tokio runtime.
    pub async fn configure(&self, config: SequenceConfig) -> Result<CounterKey, SequenceError> {
        let key = config.key();
        if self.registry.register(config).await? {
            let registry = Arc::clone(&self.registry);
            let task_key = key.clone();
            tokio::spawn(async move {
                if let Err(e) = registry.bootstrap(&task_key).await {
                    error!(counter = %task_key, error = %e, "background counter bootstrap failed");
                }
            });
        }
        Ok(key)
    }

    /// Register `config` and wait until its counter is ready.
    pub async fn configure_and_wait(&self, config: SequenceConfig) -> Result<CounterKey, SequenceError> {
        let key = self.configure(config).await?;
        self.registry.wait_ready(&key, self.settings.readiness_timeout()).await?;
        Ok(key)
    }

    /// Re-run bootstrap for an already configured counter.
    ///
    /// Safe to call at any time; an existing row is left as it is.
    pub async fn bootstrap(&self, owner: &str, field: &str) -> Result<(), SequenceError> {
        self.registry.bootstrap(&CounterKey::new(owner, field)).await
    }

    /// Whether the counter is configured and its row is known to exist.
    pub async fn is_ready(&self, owner: &str, field: &str) -> bool {
        matches!(self.readiness(owner, field).await, Ok(Readiness::Ready))
    }

    pub async fn readiness(&self, owner: &str, field: &str) -> Result<Readiness, SequenceError> {
        self.registry.readiness(&CounterKey::new(owner, field)).await
    }

    /// Atomically advance the counter and return the new value.
    ///
    /// Waits for bootstrap if it is still running. If the row is missing at
    /// increment time (for example it was removed behind our back) the
    /// increment is retried every poll interval. Both waits share one
    /// readiness timeout; once it elapses `CounterNotFound` is returned.
    /// Nothing is ever created here, so a missing row cannot be silently reset.
    #[instrument(skip(self), level = "debug")]
    pub async fn consume_next(&self, owner: &str, field: &str) -> Result<i64, SequenceError> {
        let key = CounterKey::new(owner, field);
        let config = self.registry.config(&key).await?;
        let started = Instant::now();
        let deadline = started + self.settings.readiness_timeout();
        self.registry.wait_ready(&key, self.settings.readiness_timeout()).await?;

        loop {
            match self.registry.store().increment_and_fetch(&key, config.increment).await {
                Ok(counter) => {
                    debug!(counter = %key, value = counter.count, "allocated sequence value");
                    return Ok(counter.count);
                }
                Err(e) if e.is_not_found() => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return CounterNotFoundSnafu {
                            owner,
                            field,
                            waited_ms: started.elapsed().as_millis() as u64,
                        }
                        .fail();
                    }
                    warn!(counter = %key, "counter row missing, retrying increment");
                    tokio::time::sleep(remaining.min(self.settings.readiness_poll_interval())).await;
                }
                Err(e) => return Err(SequenceError::from_store(owner, field, e)),
            }
        }
    }

    /// Report the value the next consumption would return, without consuming it.
    ///
    /// Advisory only: a concurrent consumer may take this value first. A
    /// counter whose row does not exist yet reports its start value.
    pub async fn peek_next(&self, owner: &str, field: &str) -> Result<i64, SequenceError> {
        let key = CounterKey::new(owner, field);
        let config = self.registry.config(&key).await?;
        let stored = self
            .registry
            .store()
            .find_counter(&key)
            .await
            .map_err(|e| SequenceError::from_store(owner, field, e))?;

        match compute_peek_value(stored.map(|counter| counter.count), config.start_value, config.increment) {
            Some(value) => Ok(value),
            None => SequenceExhaustedSnafu { owner, field }.fail(),
        }
    }
}
