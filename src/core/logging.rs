//! Log initialization for the binary.
//!
//! Logs go to stderr so stdout only ever carries the report.

use crate::core::error::SpectralError;
use flexi_logger::{Logger, LoggerHandle};
use std::sync::Mutex;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Kept alive until `shutdown` so buffered records are flushed.
static LOGGER_HANDLE: Mutex<Option<LoggerHandle>> = Mutex::new(None);

/// Start logging with a `flexi_logger` spec such as `info` or
/// `warn, spectral::plugins=debug`. `RUST_LOG` wins when set.
pub fn init(spec: &str) -> Result<(), SpectralError> {
    let handle = Logger::try_with_env_or_str(spec)
        .map_err(|e| SpectralError::ConfigError(format!("invalid log spec '{}': {}", spec, e)))?
        .log_to_stderr()
        .start()
        .map_err(|e| SpectralError::ConfigError(format!("failed to start logger: {}", e)))?;

    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        *guard = Some(handle);
    }
    log::debug!("Logging initialized with '{}'", spec);
    Ok(())
}

pub fn shutdown() {
    if let Ok(mut guard) = LOGGER_HANDLE.lock() {
        if let Some(handle) = guard.take() {
            handle.flush();
        }
    }
}
