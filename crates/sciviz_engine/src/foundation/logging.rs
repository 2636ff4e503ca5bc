//! Logging utilities

pub use log::{debug, error, info, trace, warn};

use crate::core::config::LoggingConfig;

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over the configured filter. Calling this
/// more than once is harmless.
pub fn init(config: &LoggingConfig) {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&config.filter);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format_timestamp_millis();
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
