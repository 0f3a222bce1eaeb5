//! Logging initialization for the client core.
//!
//! The embedding application calls [`init_logging`] once at startup;
//! every crate in the workspace logs through `tracing`.

use tracing_subscriber::EnvFilter;

/// Initialize the logging system.
///
/// Sets up a `tracing` subscriber with:
/// - Log level from the `RUST_LOG` env var or the provided default
/// - Compact human-readable output on stderr
///
/// Calling this more than once is a no-op after the first call.
///
/// # Example
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("client started");
/// ```
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
