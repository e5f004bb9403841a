use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::clock::{Clock, SystemClock};
use super::record::{enrich_new, merge_update, position_of, Record, RecordId, Table};
use super::store::RecordStore;
use crate::errors::ServiceError;

/// In-process `RecordStore` with the same semantics as the file store.
pub struct MemoryRecordStore {
    tables: RwLock<HashMap<Table, Vec<Record>>>,
    clock: Arc<dyn Clock>,
    fail_writes: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Arc<Self> {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self { tables: RwLock::new(HashMap::new()), clock, fail_writes: AtomicBool::new(false) })
    }

    /// Make every subsequent persist fail, simulating a full or read-only disk.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self, table: Table) -> Result<(), ServiceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ServiceError::Storage(format!("{table}: writes disabled")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn read(&self, table: Table) -> Vec<Record> {
        self.tables.read().await.get(&table).cloned().unwrap_or_default()
    }

    async fn write(&self, table: Table, records: &[Record]) -> Result<(), ServiceError> {
        self.check_writable(table)?;
        self.tables.write().await.insert(table, records.to_vec());
        Ok(())
    }

    async fn insert(&self, table: Table, record: &Record) -> Result<Record, ServiceError> {
        self.check_writable(table)?;
        let rec = enrich_new(record, self.clock.now());
        self.tables.write().await.entry(table).or_default().push(rec.clone());
        Ok(rec)
    }

    async fn update(&self, table: Table, id: &RecordId, partial: Record) -> Result<Option<Record>, ServiceError> {
        let mut tables = self.tables.write().await;
        let records = tables.entry(table).or_default();
        let Some(idx) = position_of(records, id) else { return Ok(None) };
        self.check_writable(table)?;
        merge_update(&mut records[idx], partial, self.clock.now());
        Ok(Some(records[idx].clone()))
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<bool, ServiceError> {
        let mut tables = self.tables.write().await;
        let records = tables.entry(table).or_default();
        let Some(idx) = position_of(records, id) else { return Ok(false) };
        self.check_writable(table)?;
        records.remove(idx);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn record(v: serde_json::Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn memory_store_crud() -> Result<(), anyhow::Error> {
        let store = MemoryRecordStore::new();
        assert!(store.read(Table::Services).await.is_empty());

        let created = store.insert(Table::Services, &record(json!({"name": "Manicure", "price": 15}))).await?;
        let id = RecordId::of(&created).unwrap();
        assert_eq!(store.find_by_id(Table::Services, &id).await, Some(created.clone()));

        let updated = store.update(Table::Services, &id, record(json!({"price": 18}))).await?.unwrap();
        assert_eq!(updated["name"], json!("Manicure"));
        assert_eq!(updated["price"], json!(18));

        assert!(store.delete(Table::Services, &id).await?);
        assert!(!store.delete(Table::Services, &id).await?);
        assert!(store.read(Table::Services).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn same_millisecond_inserts_share_an_id() -> Result<(), anyhow::Error> {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
        let store = MemoryRecordStore::with_clock(clock);

        let a = store.insert(Table::Bookings, &record(json!({"name": "A"}))).await?;
        let b = store.insert(Table::Bookings, &record(json!({"name": "B"}))).await?;
        assert_eq!(a["id"], b["id"]);

        // Lookups resolve to the first one in table order.
        let id = RecordId::of(&a).unwrap();
        let found = store.find_by_id(Table::Bookings, &id).await.unwrap();
        assert_eq!(found["name"], json!("A"));
        assert!(store.delete(Table::Bookings, &id).await?);
        let left = store.read(Table::Bookings).await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0]["name"], json!("B"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_writes_surface_and_leave_table_unchanged() -> Result<(), anyhow::Error> {
        let store = MemoryRecordStore::new();
        let created = store.insert(Table::Products, &record(json!({"name": "Serum"}))).await?;
        store.fail_writes(true);

        assert!(matches!(store.insert(Table::Products, &record(json!({"name": "Oil"}))).await, Err(ServiceError::Storage(_))));
        let id = RecordId::of(&created).unwrap();
        assert!(store.update(Table::Products, &id, record(json!({"name": "x"}))).await.is_err());
        // Not-found is still reported as absence, not as a write error.
        assert!(!store.delete(Table::Products, &RecordId::from(1)).await?);
        assert_eq!(store.read(Table::Products).await, vec![created]);
        Ok(())
    }
}
