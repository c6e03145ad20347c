//! Tracing subscriber configuration for lumen nodes.
//!
//! Log levels follow these conventions:
//! - ERROR: unrecoverable failures
//! - WARN: recoverable anomalies (unknown reply ids, purged requests)
//! - INFO: high-level link events
//! - DEBUG: flow-control state changes (deferrals, manager adjustments)
//! - TRACE: per-request bookkeeping (debits, resyncs)

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSection;

/// Initialize the tracing subscriber from the `[logging]` config section.
///
/// The section's `level` is the default filter; `RUST_LOG` overrides it.
/// The `json` flag switches to JSON-formatted lines for structured
/// collection.
pub fn init(logging: &LoggingSection) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Initialize the tracing subscriber for tests.
///
/// Uses `try_init` to avoid panicking if called multiple times.
pub fn init_for_tests() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
