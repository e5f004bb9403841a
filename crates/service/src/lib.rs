//! Service layer for the salon backend.
//! - `storage`: the `RecordStore` seam, record/id semantics and an in-memory store.
//! - `file`: file-backed table store and upload storage.
//! - `validation`, `booking`, `auth`: business rules on top of the store.

pub mod errors;
pub mod auth;
pub mod runtime;
pub mod storage;
pub mod file;
pub mod validation;
pub mod booking;
