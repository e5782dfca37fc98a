//! Sequenced models.
//!
//! A [`SequencedModel`] binds an owner to one or more sequenced fields and
//! runs their assignment hooks before each save.

use std::sync::Arc;

use async_trait::async_trait;
use ordinal_core::CounterStore;

use crate::allocator::SequenceAllocator;
use crate::config::SequenceConfig;
use crate::error::InvalidConfigurationSnafu;
use crate::error::NotConfiguredSnafu;
use crate::error::SequenceError;
use crate::hook::Assignment;
use crate::hook::AssignmentHook;
use crate::hook::RecordWriter;
use crate::hook::SaveError;
use crate::hook::SequencedRecord;

/// An owner whose records get sequence values on save.
pub struct SequencedModel<S: CounterStore + ?Sized + 'static> {
    owner: String,
    allocator: Arc<SequenceAllocator<S>>,
    hooks: Vec<AssignmentHook<S>>,
}

impl<S: CounterStore + ?Sized + 'static> SequencedModel<S> {
    /// Configure `config` on the allocator and bind a model to it.
    ///
    /// The counter bootstraps in the background; saves wait for it.
    pub async fn attach(allocator: Arc<SequenceAllocator<S>>, config: SequenceConfig) -> Result<Self, SequenceError> {
        let key = allocator.configure(config).await?;
        Ok(Self {
            owner: key.owner.clone(),
            hooks: vec![AssignmentHook::new(Arc::clone(&allocator), key)],
            allocator,
        })
    }

    /// Sequence another field of the same owner.
    pub async fn with_sequence(mut self, config: SequenceConfig) -> Result<Self, SequenceError> {
        if config.owner != self.owner {
            return InvalidConfigurationSnafu {
                owner: config.owner.clone(),
                field: config.field.clone(),
                reason: format!("model is bound to owner '{}'", self.owner),
            }
            .fail();
        }

        let key = self.allocator.configure(config).await?;
        if !self.hooks.iter().any(|hook| hook.key() == &key) {
            self.hooks.push(AssignmentHook::new(Arc::clone(&self.allocator), key));
        }
        Ok(self)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Sequenced fields, primary first.
    pub fn fields(&self) -> Vec<&str> {
        self.hooks.iter().map(|hook| hook.key().field.as_str()).collect()
    }

    pub fn allocator(&self) -> &Arc<SequenceAllocator<S>> {
        &self.allocator
    }

    /// Peek the next value of the primary field.
    pub async fn next_count(&self) -> Result<i64, SequenceError> {
        let field = self.hooks.first().map(|hook| hook.key().field.as_str()).unwrap_or_default();
        self.next_count_for(field).await
    }

    /// Peek the next value of `field`.
    pub async fn next_count_for(&self, field: &str) -> Result<i64, SequenceError> {
        if !self.hooks.iter().any(|hook| hook.key().field == field) {
            return NotConfiguredSnafu {
                owner: self.owner.as_str(),
                field,
            }
            .fail();
        }
        self.allocator.peek_next(&self.owner, field).await
    }

    /// Run every hook on `record`, in field order.
    ///
    /// Stops at the first failure; fields numbered before it keep their values.
    pub async fn prepare<R: SequencedRecord>(&self, record: &mut R) -> Result<Vec<Assignment>, SequenceError> {
        let mut assignments = Vec::with_capacity(self.hooks.len());
        for hook in &self.hooks {
            assignments.push(hook.before_persist(record).await?);
        }
        Ok(assignments)
    }

    /// Number `record` and persist it through `writer`.
    pub async fn save<R, W>(&self, mut record: R, writer: &W) -> Result<R, SaveError<W::Error>>
    where
        R: SequencedRecord + Sync,
        W: RecordWriter<R> + ?Sized,
    {
        self.prepare(&mut record).await?;
        writer.persist(&self.owner, &record).await.map_err(SaveError::Persist)?;
        Ok(record)
    }
}

/// Record-level access to a model's counter.
#[async_trait]
pub trait RecordSequenceExt: SequencedRecord + Sync {
    /// The value the model's next save would assign to its primary field.
    async fn next_count<S>(&self, model: &SequencedModel<S>) -> Result<i64, SequenceError>
    where S: CounterStore + ?Sized + 'static {
        model.next_count().await
    }
}

impl<R: SequencedRecord + Sync> RecordSequenceExt for R {}

#[cfg(test)]
mod tests {
    use ordinal_core::InMemoryCounterStore;

    use super::*;
    use crate::document::Document;

    async fn allocator() -> Arc<SequenceAllocator<InMemoryCounterStore>> {
        Arc::new(SequenceAllocator::with_default_settings(InMemoryCounterStore::new()))
    }

    #[tokio::test]
    async fn test_attach_and_peek() {
        let model = SequencedModel::attach(allocator().await, SequenceConfig::for_owner("Book")).await.unwrap();
        assert_eq!(model.owner(), "Book");
        assert_eq!(model.fields(), vec!["_id"]);
        assert_eq!(model.next_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_prepare_numbers_every_field() {
        let model = SequencedModel::attach(allocator().await, SequenceConfig::for_owner("Book"))
            .await
            .unwrap()
            .with_sequence(SequenceConfig::new("Book", "serial").starting_at(1000).incrementing_by(10))
            .await
            .unwrap();

        let mut doc = Document::new().with("title", "Dune");
        let assignments = model.prepare(&mut doc).await.unwrap();
        assert_eq!(assignments, vec![Assignment::Allocated(0), Assignment::Allocated(1000)]);

        let mut doc = Document::new().with("serial", 5);
        let assignments = model.prepare(&mut doc).await.unwrap();
        assert_eq!(assignments, vec![Assignment::Allocated(1), Assignment::AlreadyNumbered(5)]);
        assert_eq!(model.next_count_for("serial").await.unwrap(), 1010);
    }

    #[tokio::test]
    async fn test_with_sequence_rejects_other_owner() {
        let model = SequencedModel::attach(allocator().await, SequenceConfig::for_owner("Book")).await.unwrap();
        let err = model.with_sequence(SequenceConfig::for_owner("Author")).await.err().unwrap();
        assert!(matches!(err, SequenceError::InvalidConfiguration { .. }));
    }

    #[tokio::test]
    async fn test_with_sequence_same_field_is_not_duplicated() {
        let model = SequencedModel::attach(allocator().await, SequenceConfig::for_owner("Book"))
            .await
            .unwrap()
            .with_sequence(SequenceConfig::for_owner("Book"))
            .await
            .unwrap();
        assert_eq!(model.fields(), vec!["_id"]);
    }

    #[tokio::test]
    async fn test_next_count_for_unknown_field() {
        let model = SequencedModel::attach(allocator().await, SequenceConfig::for_owner("Book")).await.unwrap();
        let err = model.next_count_for("serial").await.unwrap_err();
        assert_eq!(err, SequenceError::NotConfigured {
            owner: "Book".to_string(),
            field: "serial".to_string(),
        });
    }

    #[tokio::test]
    async fn test_record_level_next_count() {
        let model = SequencedModel::attach(allocator().await, SequenceConfig::for_owner("Book").starting_at(3))
            .await
            .unwrap();
        let mut doc = Document::new();
        model.prepare(&mut doc).await.unwrap();

        assert_eq!(doc.sequence_value("_id"), Some(3));
        assert_eq!(doc.next_count(&model).await.unwrap(), 4);
    }
}
