//! In-memory document collection standing in for the application's database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use ordinal::Document;
use ordinal::RecordWriter;
use snafu::Snafu;
use tokio::sync::Mutex;

#[derive(Debug, Snafu)]
pub enum CollectionError {
    #[snafu(display("duplicate key {field}={value} in '{owner}'"))]
    DuplicateKey { owner: String, field: String, value: String },

    #[snafu(display("collection '{owner}' is read-only"))]
    ReadOnly { owner: String },
}

/// Stores documents per owner and enforces a unique index on one field.
pub struct DocumentCollection {
    unique_field: String,
    read_only: bool,
    docs: Mutex<BTreeMap<String, Vec<Document>>>,
}

impl DocumentCollection {
    pub fn with_unique_field(field: &str) -> Self {
        Self {
            unique_field: field.to_string(),
            read_only: false,
            docs: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::with_unique_field("_id")
        }
    }

    pub async fn documents(&self, owner: &str) -> Vec<Document> {
        self.docs.lock().await.get(owner).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl RecordWriter<Document> for DocumentCollection {
    type Error = CollectionError;

    async fn persist(&self, owner: &str, record: &Document) -> Result<(), CollectionError> {
        if self.read_only {
            return ReadOnlySnafu { owner }.fail();
        }

        let mut docs = self.docs.lock().await;
        let existing = docs.entry(owner.to_string()).or_default();
        if let Some(value) = record.get(&self.unique_field) {
            if existing.iter().any(|doc| doc.get(&self.unique_field) == Some(value)) {
                return DuplicateKeySnafu {
                    owner,
                    field: self.unique_field.as_str(),
                    value: value.to_string(),
                }
                .fail();
            }
        }
        existing.push(record.clone());
        Ok(())
    }
}
