//! Shared fixtures for the ordinal integration tests.

#![allow(dead_code)]

pub mod collection;
pub mod stores;

use ordinal::SequenceSettings;

/// Opt-in log output, controlled by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Settings with short readiness bounds so failure paths finish quickly.
pub fn fast_settings() -> SequenceSettings {
    SequenceSettings {
        readiness_poll_interval_ms: 1,
        readiness_timeout_ms: 50,
        ..Default::default()
    }
}
