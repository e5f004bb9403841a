//! Tracing setup for the salon server.
//!
//! `RUST_LOG` always wins; the fallbacks below apply when it is unset or
//! does not parse. Both formats write to stdout.

use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Requests, startup and store warnings.
pub const TEXT_FILTER: &str = "info,tower_http=info,axum=info";

/// Same as text, plus a `debug` event for every table file the store saves.
pub const JSON_FILTER: &str = "info,tower_http=info,service::file=debug";

fn filter_or(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Compact human-readable lines for local runs.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(filter_or(TEXT_FILTER))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event, carrying the target so store events
/// (`service::file::table_store`) can be filtered downstream.
pub fn init_logging_json() {
    let _ = fmt()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_env_filter(filter_or(JSON_FILTER))
        .with_target(true)
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the output format from `logging.json`.
pub fn init_logging(json: bool) {
    if json { init_logging_json() } else { init_logging_default() }
}
