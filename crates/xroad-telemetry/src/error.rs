//! Telemetry errors.

use thiserror::Error;

/// Failure to install logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Unparseable filter directive.
    #[error("invalid log filter {0}")]
    InvalidFilter(String),

    /// A global subscriber was already set.
    #[error("logging already initialised: {0}")]
    LoggingInit(String),
}
