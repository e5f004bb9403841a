//! Shared helpers for the salon backend crates: logging setup, startup
//! directory checks and small response types.

pub mod types;
pub mod utils;
pub mod env;
