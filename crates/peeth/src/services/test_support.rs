//! Storage wrapper for interleaving tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use peeth_core::storage::{
    BatchWriteOp, Filter, Page, QueryOptions, Record, RecordKey, Result, Storage, UpdateOptions,
};

use crate::storage::document::DocumentStore;

/// Serves a record read earlier to the next `get` of its key, as if that
/// read had happened before any write made since.
pub struct StaleReads {
    inner: Arc<dyn Storage>,
    snapshots: Mutex<HashMap<RecordKey, Record>>,
}

impl StaleReads {
    pub async fn open() -> Arc<Self> {
        let store = DocumentStore::open_in_memory().await.unwrap();
        Arc::new(Self {
            inner: Arc::new(store),
            snapshots: Mutex::new(HashMap::new()),
        })
    }

    /// Makes the next `get` of the record's key return this copy.
    pub fn replay(&self, record: Record) {
        self.snapshots.lock().unwrap().insert(record.key(), record);
    }
}

#[async_trait]
impl Storage for StaleReads {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        let snapshot = self.snapshots.lock().unwrap().remove(key);
        match snapshot {
            Some(record) => Ok(Some(record)),
            None => self.inner.get(key).await,
        }
    }

    async fn put(&self, record: Record) -> Result<Record> {
        self.inner.put(record).await
    }

    async fn delete(&self, key: &RecordKey) -> Result<()> {
        self.inner.delete(key).await
    }

    async fn query(&self, entity_type: &str, options: QueryOptions) -> Result<Page> {
        self.inner.query(entity_type, options).await
    }

    async fn scan(&self, entity_type: &str, filter: Option<Filter>) -> Result<Vec<Record>> {
        self.inner.scan(entity_type, filter).await
    }

    async fn update(&self, entity_type: &str, options: UpdateOptions) -> Result<Record> {
        self.inner.update(entity_type, options).await
    }

    async fn batch_get(&self, keys: &[RecordKey]) -> Result<Vec<Record>> {
        self.inner.batch_get(keys).await
    }

    async fn batch_write(&self, ops: Vec<BatchWriteOp>) -> Result<()> {
        self.inner.batch_write(ops).await
    }

    fn backend_name(&self) -> &'static str {
        "stale-reads"
    }
}
