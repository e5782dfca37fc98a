//! Counter row types.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Identity of a counter: the owning collection and the sequenced field.
///
/// At most one counter row exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CounterKey {
    /// Logical collection/model the counter belongs to.
    pub owner: String,
    /// Numeric field being sequenced on that owner.
    pub field: String,
}

impl CounterKey {
    pub fn new(owner: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.field)
    }
}

/// A persisted counter row.
///
/// `count` is the last value handed out (or `start_value - increment` before
/// the first consumption).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub owner: String,
    pub field: String,
    pub count: i64,
}

impl Counter {
    pub fn new(key: &CounterKey, count: i64) -> Self {
        Self {
            owner: key.owner.clone(),
            field: key.field.clone(),
            count,
        }
    }

    pub fn key(&self) -> CounterKey {
        CounterKey::new(self.owner.clone(), self.field.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = CounterKey::new("Book", "_id");
        assert_eq!(key.to_string(), "Book._id");
    }

    #[test]
    fn test_counter_key_roundtrip() {
        let key = CounterKey::new("Plugged", "id");
        let counter = Counter::new(&key, 4);
        assert_eq!(counter.key(), key);
        assert_eq!(counter.count, 4);
    }

    #[test]
    fn test_counter_row_shape() {
        let counter = Counter::new(&CounterKey::new("Book", "_id"), -1);
        let json = serde_json::to_value(&counter).unwrap();
        assert_eq!(json, serde_json::json!({ "owner": "Book", "field": "_id", "count": -1 }));
    }
}
