use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};
use tracing::{debug, info, warn};

use crate::errors::ServiceError;
use crate::storage::clock::{Clock, SystemClock};
use crate::storage::record::{enrich_new, merge_update, position_of, Record, RecordId, Table};
use crate::storage::store::RecordStore;

/// JSON file-backed record store: one `<table>.json` array per table.
///
/// Every operation re-reads the whole file; nothing is cached between calls.
/// Every operation, `read` included, holds a per-table lock: writers do not
/// lose each other's changes, and a reader never sees a file that is halfway
/// through being rewritten. Separate processes sharing a data directory are
/// not coordinated.
pub struct FileRecordStore {
    dir: PathBuf,
    locks: HashMap<Table, Mutex<()>>,
    clock: Arc<dyn Clock>,
}

impl FileRecordStore {
    /// Open the store rooted at `dir`, creating missing table files.
    pub async fn open<P: Into<PathBuf>>(dir: P) -> Result<Arc<Self>, ServiceError> {
        Self::open_with_clock(dir, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock<P: Into<PathBuf>>(dir: P, clock: Arc<dyn Clock>) -> Result<Arc<Self>, ServiceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(ServiceError::storage)?;
        let locks = Table::ALL.into_iter().map(|t| (t, Mutex::new(()))).collect();
        let store = Self { dir, locks, clock };
        store.ensure_tables().await?;
        Ok(Arc::new(store))
    }

    /// Create `[]` for every table file that does not exist yet.
    /// Existing files are left untouched, even when they do not parse.
    pub async fn ensure_tables(&self) -> Result<(), ServiceError> {
        for table in Table::ALL {
            let path = self.path_for(table);
            if fs::metadata(&path).await.is_ok() {
                continue;
            }
            fs::write(&path, b"[]").await.map_err(ServiceError::storage)?;
            info!(table = %table, path = %path.display(), "created empty table file");
        }
        Ok(())
    }

    pub fn path_for(&self, table: Table) -> PathBuf {
        self.dir.join(table.file_name())
    }

    fn lock(&self, table: Table) -> &Mutex<()> {
        // Every Table variant is inserted in `open_with_clock`.
        &self.locks[&table]
    }

    async fn load(&self, table: Table) -> Vec<Record> {
        let path = self.path_for(table);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(table = %table, path = %path.display(), error = %e, "table read failed; treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_slice::<Vec<Record>>(&bytes) {
            Ok(records) => records,
            Err(e) => {
                warn!(table = %table, path = %path.display(), error = %e, "table file is not a JSON array of objects; treating as empty");
                Vec::new()
            }
        }
    }

    async fn save(&self, table: Table, records: &[Record]) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(records).map_err(ServiceError::storage)?;
        fs::write(self.path_for(table), data).await.map_err(ServiceError::storage)?;
        debug!(table = %table, count = records.len(), "table saved");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn read(&self, table: Table) -> Vec<Record> {
        let _guard = self.lock(table).lock().await;
        self.load(table).await
    }

    async fn write(&self, table: Table, records: &[Record]) -> Result<(), ServiceError> {
        let _guard = self.lock(table).lock().await;
        self.save(table, records).await
    }

    async fn insert(&self, table: Table, record: &Record) -> Result<Record, ServiceError> {
        let _guard = self.lock(table).lock().await;
        let mut records = self.load(table).await;
        let rec = enrich_new(record, self.clock.now());
        records.push(rec.clone());
        self.save(table, &records).await?;
        Ok(rec)
    }

    async fn update(&self, table: Table, id: &RecordId, partial: Record) -> Result<Option<Record>, ServiceError> {
        let _guard = self.lock(table).lock().await;
        let mut records = self.load(table).await;
        let Some(idx) = position_of(&records, id) else { return Ok(None) };
        merge_update(&mut records[idx], partial, self.clock.now());
        self.save(table, &records).await?;
        Ok(Some(records.swap_remove(idx)))
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<bool, ServiceError> {
        let _guard = self.lock(table).lock().await;
        let mut records = self.load(table).await;
        let Some(idx) = position_of(&records, id) else { return Ok(false) };
        records.remove(idx);
        self.save(table, &records).await?;
        Ok(true)
    }
}
