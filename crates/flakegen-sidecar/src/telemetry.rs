//! Logging initialization for the sidecar.
//!
//! - Uses `tracing-subscriber`'s `fmt` layer.
//! - Pulls filtering rules from `RUST_LOG` or defaults to `info`.
//! - Includes thread ID, file, and line number for traceability.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber.
///
/// Call once, before anything logs.
pub fn init_tracing() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
