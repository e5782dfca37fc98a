//! Allocator settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `ORDINAL_*` environment variables. The result is validated once, after
//! every layer has been applied.

use std::path::Path;
use std::time::Duration;

use ordinal_core::constants::DEFAULT_ARBITER_QUEUE_DEPTH;
use ordinal_core::constants::DEFAULT_READINESS_POLL_INTERVAL_MS;
use ordinal_core::constants::DEFAULT_READINESS_TIMEOUT_MS;
use ordinal_core::constants::MAX_ARBITER_QUEUE_DEPTH;
use ordinal_core::constants::MAX_READINESS_POLL_INTERVAL_MS;
use ordinal_core::constants::MAX_READINESS_TIMEOUT_MS;
use ordinal_core::verified::is_valid_name;
use ordinal_core::DEFAULT_COUNTER_COLLECTION;
use ordinal_core::MAX_NAME_LENGTH;
use serde::Deserialize;
use serde::Serialize;

pub const ENV_READINESS_POLL_MS: &str = "ORDINAL_READINESS_POLL_MS";
pub const ENV_READINESS_TIMEOUT_MS: &str = "ORDINAL_READINESS_TIMEOUT_MS";
pub const ENV_COUNTER_COLLECTION: &str = "ORDINAL_COUNTER_COLLECTION";
pub const ENV_ARBITER_QUEUE_DEPTH: &str = "ORDINAL_ARBITER_QUEUE_DEPTH";

/// Settings shared by every counter of one allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceSettings {
    /// How often a consumer re-checks a counter row that is not there yet.
    pub readiness_poll_interval_ms: u64,
    /// Upper bound on waiting for a counter to become ready.
    pub readiness_timeout_ms: u64,
    /// Name of the reserved collection/table that holds counter rows.
    pub counter_collection: String,
    /// Pending increments buffered per counter by the arbiter.
    pub arbiter_queue_depth: u32,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            readiness_poll_interval_ms: DEFAULT_READINESS_POLL_INTERVAL_MS,
            readiness_timeout_ms: DEFAULT_READINESS_TIMEOUT_MS,
            counter_collection: DEFAULT_COUNTER_COLLECTION.to_string(),
            arbiter_queue_depth: DEFAULT_ARBITER_QUEUE_DEPTH,
        }
    }
}

/// Settings errors.
#[derive(Debug)]
pub enum ConfigError {
    /// A value is out of range or malformed.
    InvalidValue { key: String, value: String, reason: String },
    /// The settings file could not be read.
    ReadFile { path: String, reason: String },
    /// The settings file is not valid TOML for [`SequenceSettings`].
    Parse { reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "Invalid configuration for {}: '{}' ({})", key, value, reason)
            }
            ConfigError::ReadFile { path, reason } => {
                write!(f, "Failed to read configuration file {}: {}", path, reason)
            }
            ConfigError::Parse { reason } => write!(f, "Failed to parse configuration: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SequenceSettings {
    /// Parse settings from TOML. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse { reason: e.to_string() })
    }

    /// Read and parse a TOML settings file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Defaults, then `file` if given, then environment overrides; validated.
    pub fn load_with_layers(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match file {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `ORDINAL_*` environment variables on top of the current values.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `lookup` instead of the process environment.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(val) = lookup(ENV_READINESS_POLL_MS) {
            self.readiness_poll_interval_ms = parse_number(ENV_READINESS_POLL_MS, &val)?;
        }
        if let Some(val) = lookup(ENV_READINESS_TIMEOUT_MS) {
            self.readiness_timeout_ms = parse_number(ENV_READINESS_TIMEOUT_MS, &val)?;
        }
        if let Some(val) = lookup(ENV_COUNTER_COLLECTION) {
            self.counter_collection = val;
        }
        if let Some(val) = lookup(ENV_ARBITER_QUEUE_DEPTH) {
            self.arbiter_queue_depth = parse_number(ENV_ARBITER_QUEUE_DEPTH, &val)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.readiness_poll_interval_ms == 0 || self.readiness_poll_interval_ms > MAX_READINESS_POLL_INTERVAL_MS {
            return Err(ConfigError::InvalidValue {
                key: "readiness_poll_interval_ms".to_string(),
                value: self.readiness_poll_interval_ms.to_string(),
                reason: format!("must be between 1 and {}", MAX_READINESS_POLL_INTERVAL_MS),
            });
        }
        if self.readiness_timeout_ms < self.readiness_poll_interval_ms
            || self.readiness_timeout_ms > MAX_READINESS_TIMEOUT_MS
        {
            return Err(ConfigError::InvalidValue {
                key: "readiness_timeout_ms".to_string(),
                value: self.readiness_timeout_ms.to_string(),
                reason: format!(
                    "must be between readiness_poll_interval_ms ({}) and {}",
                    self.readiness_poll_interval_ms, MAX_READINESS_TIMEOUT_MS
                ),
            });
        }
        if !is_valid_name(&self.counter_collection, MAX_NAME_LENGTH) {
            return Err(ConfigError::InvalidValue {
                key: "counter_collection".to_string(),
                value: self.counter_collection.clone(),
                reason: format!("must be 1..={} bytes", MAX_NAME_LENGTH),
            });
        }
        if self.arbiter_queue_depth == 0 || self.arbiter_queue_depth > MAX_ARBITER_QUEUE_DEPTH {
            return Err(ConfigError::InvalidValue {
                key: "arbiter_queue_depth".to_string(),
                value: self.arbiter_queue_depth.to_string(),
                reason: format!("must be between 1 and {}", MAX_ARBITER_QUEUE_DEPTH),
            });
        }
        Ok(())
    }

    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where T::Err: std::fmt::Display {
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = SequenceSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.readiness_poll_interval(), Duration::from_millis(5));
        assert_eq!(settings.counter_collection, "__ordinal_counters");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = SequenceSettings::from_toml_str("readiness_timeout_ms = 2500\n").unwrap();
        assert_eq!(settings.readiness_timeout_ms, 2500);
        assert_eq!(settings.readiness_poll_interval_ms, DEFAULT_READINESS_POLL_INTERVAL_MS);
        assert_eq!(settings.arbiter_queue_depth, DEFAULT_ARBITER_QUEUE_DEPTH);
    }

    #[test]
    fn test_malformed_toml() {
        let err = SequenceSettings::from_toml_str("readiness_timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let mut settings = SequenceSettings::from_toml_str("counter_collection = \"from_file\"").unwrap();
        settings
            .apply_overrides_from(lookup_from(&[
                (ENV_COUNTER_COLLECTION, "from_env"),
                (ENV_READINESS_POLL_MS, " 20 "),
            ]))
            .unwrap();
        assert_eq!(settings.counter_collection, "from_env");
        assert_eq!(settings.readiness_poll_interval_ms, 20);
    }

    #[test]
    fn test_unparseable_override() {
        let mut settings = SequenceSettings::default();
        let err = settings.apply_overrides_from(lookup_from(&[(ENV_ARBITER_QUEUE_DEPTH, "lots")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, ENV_ARBITER_QUEUE_DEPTH);
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidValue, got {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let zero_poll = SequenceSettings {
            readiness_poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(zero_poll.validate().is_err());

        let timeout_below_poll = SequenceSettings {
            readiness_poll_interval_ms: 100,
            readiness_timeout_ms: 50,
            ..Default::default()
        };
        assert!(timeout_below_poll.validate().is_err());

        let empty_collection = SequenceSettings {
            counter_collection: String::new(),
            ..Default::default()
        };
        assert!(empty_collection.validate().is_err());

        let huge_queue = SequenceSettings {
            arbiter_queue_depth: MAX_ARBITER_QUEUE_DEPTH + 1,
            ..Default::default()
        };
        assert!(huge_queue.validate().is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "readiness_poll_interval_ms = 10").unwrap();
        writeln!(file, "arbiter_queue_depth = 64").unwrap();

        let settings = SequenceSettings::from_toml_file(file.path()).unwrap();
        assert_eq!(settings.readiness_poll_interval_ms, 10);
        assert_eq!(settings.arbiter_queue_depth, 64);
    }

    #[test]
    fn test_missing_file() {
        let err = SequenceSettings::from_toml_file(Path::new("/nonexistent/ordinal.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
