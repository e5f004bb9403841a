//! File-system backed implementations.

pub mod table_store;
pub mod uploads;

pub use table_store::FileRecordStore;
pub use uploads::{StoredUpload, UploadKind, UploadStore};
