//! Structured logging setup.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "cockpit_client=info,cockpit_invoke=info";

/// Install the global `tracing` subscriber.
///
/// Safe to call more than once: later calls are no-ops, which keeps tests
/// and embedding applications from fighting over the global dispatcher.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
