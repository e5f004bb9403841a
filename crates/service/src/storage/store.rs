use async_trait::async_trait;

use super::record::{position_of, Record, RecordId, Table};
use crate::errors::ServiceError;

/// Whole-table CRUD over schema-less records.
///
/// `read` never fails: an unreadable or malformed table comes back empty,
/// which callers cannot tell apart from a table that really is empty.
/// `write` replaces the whole table, so a caller doing its own
/// read-modify-write can lose a concurrent change (last writer wins).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn read(&self, table: Table) -> Vec<Record>;

    async fn write(&self, table: Table, records: &[Record]) -> Result<(), ServiceError>;

    /// Store an enriched copy of `record` (new `id`, `created_at`) and return it.
    async fn insert(&self, table: Table, record: &Record) -> Result<Record, ServiceError>;

    async fn find_by_id(&self, table: Table, id: &RecordId) -> Option<Record> {
        let records = self.read(table).await;
        position_of(&records, id).map(|i| records[i].clone())
    }

    /// Shallow-merge `partial` into the first matching record; `Ok(None)` if absent.
    async fn update(&self, table: Table, id: &RecordId, partial: Record) -> Result<Option<Record>, ServiceError>;

    /// Remove the first matching record; returns whether one was removed.
    async fn delete(&self, table: Table, id: &RecordId) -> Result<bool, ServiceError>;
}
