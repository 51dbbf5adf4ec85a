use async_trait::async_trait;

use super::{BatchWriteOp, Filter, Page, QueryOptions, Record, RecordKey, Result, UpdateOptions};

/// Uniform storage contract over the single-table record layout.
///
/// Services hold an `Arc<dyn Storage>` and never know which backend serves
/// them. `entity_type` is the partition key token (`CMS_PAGE`, `USER`, ...);
/// the document backend uses it to pick a collection, DynamoDB ignores it
/// for keyed operations.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Gets a record by its primary key.
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>>;

    /// Upserts a record, stamping `updatedAt` (and `createdAt` when absent).
    async fn put(&self, record: Record) -> Result<Record>;

    /// Deletes a record. Deleting a missing record succeeds.
    async fn delete(&self, key: &RecordKey) -> Result<()>;

    /// Queries one partition of an index.
    async fn query(&self, entity_type: &str, options: QueryOptions) -> Result<Page>;

    /// Reads every record of an entity type. Fallback for access patterns
    /// no index covers.
    async fn scan(&self, entity_type: &str, filter: Option<Filter>) -> Result<Vec<Record>>;

    /// Applies a partial update and returns the updated record.
    ///
    /// Fails with `NotFound` when no record has the key.
    async fn update(&self, entity_type: &str, options: UpdateOptions) -> Result<Record>;

    /// Reads many records by key. Missing keys are skipped.
    async fn batch_get(&self, keys: &[RecordKey]) -> Result<Vec<Record>>;

    /// Applies puts and deletes in sequential chunks.
    async fn batch_write(&self, ops: Vec<BatchWriteOp>) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
