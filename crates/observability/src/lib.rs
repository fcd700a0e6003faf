//! Logging setup shared by every binary and test harness in the workspace.

/// Subscriber configuration (format, filters).
pub mod logging;

pub use logging::{LOG_FORMAT_ENV, LogFormat};

/// Initialize process-wide logging.
///
/// The format comes from `PHARMLOC_LOG_FORMAT` (`json` or `compact`,
/// default `json`); the filter from `RUST_LOG` (default `info`).
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    let format = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default();
    logging::init_with(format);
}
