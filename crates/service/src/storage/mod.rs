//! Storage abstractions for the service layer
//!
//! `RecordStore` is the seam every route and service goes through; the
//! file-backed implementation lives in `crate::file`, the in-memory one here.

pub mod clock;
pub mod memory;
pub mod record;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use memory::MemoryRecordStore;
pub use record::{Record, RecordId, Table};
pub use store::RecordStore;
