//! Per-counter allocator configuration.

use ordinal_core::CounterKey;
use ordinal_core::DEFAULT_INCREMENT;
use ordinal_core::DEFAULT_SEQUENCE_FIELD;
use ordinal_core::DEFAULT_START_VALUE;
use ordinal_core::MAX_NAME_LENGTH;
use ordinal_core::verified::compute_initial_count;
use ordinal_core::verified::is_valid_name;
use serde::Deserialize;
use serde::Serialize;

use crate::error::InvalidConfigurationSnafu;
use crate::error::SequenceError;

/// Configuration of one sequenced field.
///
/// Maps 1:1 to a counter row. `increment` may be negative for descending
/// sequences, but it must stay the same for the counter's whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Collection/model the counter belongs to.
    pub owner: String,
    /// Field receiving the allocated values.
    #[serde(default = "default_field")]
    pub field: String,
    /// Value returned by the first consumption.
    #[serde(default = "default_start_value")]
    pub start_value: i64,
    /// Step applied on each consumption; never zero.
    #[serde(default = "default_increment")]
    pub increment: i64,
}

fn default_field() -> String {
    DEFAULT_SEQUENCE_FIELD.to_string()
}

fn default_start_value() -> i64 {
    DEFAULT_START_VALUE
}

fn default_increment() -> i64 {
    DEFAULT_INCREMENT
}

impl SequenceConfig {
    /// Sequence the owner's `_id` field, starting at 0 and stepping by 1.
    pub fn for_owner(owner: impl Into<String>) -> Self {
        Self::new(owner, DEFAULT_SEQUENCE_FIELD)
    }

    /// Sequence `field` on `owner` with the default start and step.
    pub fn new(owner: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            field: field.into(),
            start_value: DEFAULT_START_VALUE,
            increment: DEFAULT_INCREMENT,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn starting_at(mut self, start_value: i64) -> Self {
        self.start_value = start_value;
        self
    }

    pub fn incrementing_by(mut self, increment: i64) -> Self {
        self.increment = increment;
        self
    }

    pub fn key(&self) -> CounterKey {
        CounterKey::new(self.owner.clone(), self.field.clone())
    }

    /// Count a freshly created row starts at.
    ///
    /// `None` only for configurations that [`validate`](Self::validate) rejects.
    pub fn initial_count(&self) -> Option<i64> {
        compute_initial_count(self.start_value, self.increment)
    }

    /// Check the configuration before any counter traffic.
    pub fn validate(&self) -> Result<(), SequenceError> {
        if !is_valid_name(&self.owner, MAX_NAME_LENGTH) {
            return self.invalid(format!("owner must be 1..={} bytes", MAX_NAME_LENGTH));
        }
        if !is_valid_name(&self.field, MAX_NAME_LENGTH) {
            return self.invalid(format!("field must be 1..={} bytes", MAX_NAME_LENGTH));
        }
        if self.increment == 0 {
            return self.invalid("increment must be nonzero".to_string());
        }
        if self.initial_count().is_none() {
            return self.invalid(format!(
                "start value {} minus increment {} overflows",
                self.start_value, self.increment
            ));
        }
        Ok(())
    }

    /// Whether `other` describes the same counter with the same start and step.
    pub(crate) fn is_compatible_with(&self, other: &SequenceConfig) -> bool {
        self == other
    }

    fn invalid(&self, reason: String) -> Result<(), SequenceError> {
        InvalidConfigurationSnafu {
            owner: self.owner.clone(),
            field: self.field.clone(),
            reason,
        }
        .fail()
    }
}
