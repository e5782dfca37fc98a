use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use ordinal_core::Counter;
use ordinal_core::CounterKey;
use ordinal_core::CounterStore;
use ordinal_core::CounterStoreError;
use ordinal_core::verified::compute_incremented_count;
use redb::Database;
use redb::ReadableTable;
use redb::TableDefinition;
use snafu::ResultExt;
use tracing::debug;

use crate::error::*;

/// Counter rows keyed by `(owner, field)`; value is the bincode-encoded [`Counter`].
type CounterTableDefinition<'a> = TableDefinition<'a, (&'static str, &'static str), &'static [u8]>;

fn counter_table(name: &str) -> CounterTableDefinition<'_> {
    TableDefinition::new(name)
}

/// Durable counter store backed by redb.
///
/// Every mutation runs in its own write transaction. Redb admits a single
/// writer at a time, so `increment_and_fetch` is a read-modify-write that no
/// other writer can interleave with, and a committed increment survives
/// process restarts.
pub struct RedbCounterStore {
    db: Arc<Database>,
    path: PathBuf,
    table: Arc<str>,
}

impl RedbCounterStore {
    /// Create or open a counter store at `path`, keeping rows in the reserved
    /// table `table`.
    ///
    /// Creates the parent directory, database file and table if they don't exist.
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self, RedbStoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirectorySnafu { path: parent })?;
        }

        let db = Database::create(&path).context(OpenDatabaseSnafu { path: &path })?;

        let write_txn = db.begin_write().context(BeginWriteSnafu)?;
        {
            write_txn.open_table(counter_table(table)).context(OpenTableSnafu { table })?;
        }
        write_txn.commit().context(CommitSnafu)?;

        debug!(path = %path.display(), table, "opened counter store");

        Ok(Self {
            db: Arc::new(db),
            path,
            table: Arc::from(table),
        })
    }

    /// All counter rows, ordered by `(owner, field)`.
    pub fn list_counters(&self) -> Result<Vec<Counter>, RedbStoreError> {
        let read_txn = self.db.begin_read().context(BeginReadSnafu)?;
        let table = read_txn
            .open_table(counter_table(&self.table))
            .context(OpenTableSnafu { table: &*self.table })?;

        let mut counters = Vec::new();
        for item in table.iter().context(IteratorSnafu)? {
            let (key, value) = item.context(IteratorSnafu)?;
            let (owner, field) = key.value();
            counters.push(decode(&CounterKey::new(owner, field), value.value())?);
        }

        Ok(counters)
    }

    /// Path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the reserved table holding counter rows.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Run a storage operation on the blocking pool.
    ///
    /// The closure runs to completion even if the calling future is dropped,
    /// so a transaction is either committed in full or never started.
    async fn run_blocking<T, F>(&self, op: F) -> Result<T, CounterStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database, &str) -> Result<T, RedbStoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let table = Arc::clone(&self.table);
        tokio::task::spawn_blocking(move || op(&db, &table))
            .await
            .context(BlockingTaskSnafu)
            .and_then(|result| result)
            .map_err(CounterStoreError::from)
    }
}

fn encode(counter: &Counter) -> Result<Vec<u8>, RedbStoreError> {
    bincode::serialize(counter).context(SerializeSnafu { key: counter.key() })
}

fn decode(key: &CounterKey, bytes: &[u8]) -> Result<Counter, RedbStoreError> {
    bincode::deserialize(bytes).context(DeserializeSnafu { key: key.clone() })
}

fn find_row(db: &Database, table: &str, key: &CounterKey) -> Result<Option<Counter>, RedbStoreError> {
    let read_txn = db.begin_read().context(BeginReadSnafu)?;
    let rows = read_txn.open_table(counter_table(table)).context(OpenTableSnafu { table })?;

    match rows.get((key.owner.as_str(), key.field.as_str())).context(GetSnafu)? {
        Some(value) => Ok(Some(decode(key, value.value())?)),
        None => Ok(None),
    }
}

fn insert_row(db: &Database, table: &str, key: &CounterKey, initial_count: i64) -> Result<(), RedbStoreError> {
    let write_txn = db.begin_write().context(BeginWriteSnafu)?;
    {
        let mut rows = write_txn.open_table(counter_table(table)).context(OpenTableSnafu { table })?;

        let exists = rows.get((key.owner.as_str(), key.field.as_str())).context(GetSnafu)?.is_some();
        if exists {
            // Dropping the uncommitted transaction aborts it.
            return CounterExistsSnafu { key: key.clone() }.fail();
        }

        let encoded = encode(&Counter::new(key, initial_count))?;
        rows.insert((key.owner.as_str(), key.field.as_str()), encoded.as_slice()).context(InsertSnafu)?;
    }
    write_txn.commit().context(CommitSnafu)?;

    Ok(())
}

fn increment_row(db: &Database, table: &str, key: &CounterKey, delta: i64) -> Result<Counter, RedbStoreError> {
    let write_txn = db.begin_write().context(BeginWriteSnafu)?;
    let updated = {
        let mut rows = write_txn.open_table(counter_table(table)).context(OpenTableSnafu { table })?;

        let current = {
            let existing = rows
                .get((key.owner.as_str(), key.field.as_str()))
                .context(GetSnafu)?
                .ok_or_else(|| RedbStoreError::CounterNotFound { key: key.clone() })?;
            decode(key, existing.value())?
        };

        let count = compute_incremented_count(current.count, delta).ok_or_else(|| RedbStoreError::CounterOverflow {
            key: key.clone(),
            count: current.count,
            delta,
        })?;

        let updated = Counter::new(key, count);
        let encoded = encode(&updated)?;
        rows.insert((key.owner.as_str(), key.field.as_str()), encoded.as_slice()).context(InsertSnafu)?;
        updated
    };
    write_txn.commit().context(CommitSnafu)?;

    Ok(updated)
}

#[async_trait]
impl CounterStore for RedbCounterStore {
    async fn find_counter(&self, key: &CounterKey) -> Result<Option<Counter>, CounterStoreError> {
        let key = key.clone();
        self.run_blocking(move |db, table| find_row(db, table, &key)).await
    }

    async fn create_counter_if_absent(&self, key: &CounterKey, initial_count: i64) -> Result<(), CounterStoreError> {
        let key = key.clone();
        self.run_blocking(move |db, table| insert_row(db, table, &key, initial_count)).await
    }

    async fn increment_and_fetch(&self, key: &CounterKey, delta: i64) -> Result<Counter, CounterStoreError> {
        let key = key.clone();
        self.run_blocking(move |db, table| increment_row(db, table, &key, delta)).await
    }
}
