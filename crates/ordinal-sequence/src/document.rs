//! Schemaless JSON records.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::hook::SequencedRecord;

/// A JSON object record.
///
/// A field counts as numbered when it holds a JSON number with an i64 value,
/// whether written as `7` or `7.0`. Other numbers (fractions, integers
/// outside the i64 range) are reported as unusable and never overwritten.
/// Missing fields, `null` and non-numbers are unset and get a value on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl SequencedRecord for Document {
    fn sequence_value(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(integral_value)
    }

    fn set_sequence_value(&mut self, field: &str, value: i64) {
        self.0.insert(field.to_string(), Value::from(value));
    }

    fn unusable_value(&self, field: &str) -> Option<String> {
        self.0
            .get(field)
            .filter(|value| value.is_number() && integral_value(value).is_none())
            .map(Value::to_string)
    }
}

// -2^63 is exact as an f64; 2^63 is the first value past i64::MAX.
const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;
const I64_END_F64: f64 = 9_223_372_036_854_775_808.0;

fn integral_value(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| value.is_f64() && f.fract() == 0.0 && *f >= I64_MIN_F64 && *f < I64_END_F64)
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!({ "_id": 7 }), Some(7))]
    #[case(json!({ "_id": -3 }), Some(-3))]
    #[case(json!({ "_id": 7.5 }), None)]
    #[case(json!({ "_id": 7.0 }), Some(7))]
    #[case(json!({ "_id": -2.0 }), Some(-2))]
    #[case(json!({ "_id": 1e19 }), None)]
    #[case(json!({ "_id": "7" }), None)]
    #[case(json!({ "_id": null }), None)]
    #[case(json!({ "_id": u64::MAX }), None)]
    #[case(json!({ "title": "Dune" }), None)]
    fn test_sequence_value(#[case] value: Value, #[case] expected: Option<i64>) {
        let doc = Document::from_value(value).unwrap();
        assert_eq!(doc.sequence_value("_id"), expected);
    }

    #[rstest]
    #[case(json!({ "_id": 7.5 }), Some("7.5"))]
    #[case(json!({ "_id": u64::MAX }), Some("18446744073709551615"))]
    #[case(json!({ "_id": 7.0 }), None)]
    #[case(json!({ "_id": 7 }), None)]
    #[case(json!({ "_id": "7.5" }), None)]
    #[case(json!({ "_id": null }), None)]
    #[case(json!({}), None)]
    fn test_unusable_value(#[case] value: Value, #[case] expected: Option<&str>) {
        let doc = Document::from_value(value).unwrap();
        assert_eq!(doc.unusable_value("_id").as_deref(), expected);
    }

    #[test]
    fn test_set_overwrites() {
        let mut doc = Document::new().with("title", "Dune").with("_id", "pending");
        doc.set_sequence_value("_id", 3);
        assert_eq!(doc.into_value(), json!({ "title": "Dune", "_id": 3 }));
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Document::from_value(json!([1, 2])).is_none());
        assert!(Document::from_value(json!(1)).is_none());
    }

    #[test]
    fn test_serde_is_transparent() {
        let doc: Document = serde_json::from_str(r#"{"title":"Dune","id":5}"#).unwrap();
        assert_eq!(doc.sequence_value("id"), Some(5));
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({ "title": "Dune", "id": 5 }));
    }
}
