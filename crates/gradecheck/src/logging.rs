//! Tracing subscriber setup.
//!
//! `RUST_LOG` filters events (default `info`). Both initialisers may be
//! called from every test; only the first call installs a subscriber.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Human-readable logs through the test writer
///
/// Returns `false` when a subscriber was already installed.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .is_ok()
}

/// One JSON object per event, for CI log collection
pub fn init_json() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .json()
        .with_current_span(true)
        .try_init()
        .is_ok()
}
