//! Mock server errors.

use thiserror::Error;

/// Errors raised by the mock server.
#[derive(Debug, Error)]
pub enum TestError {
    /// The listener could not be bound.
    #[error("failed to bind mock security server: {0}")]
    Bind(#[from] std::io::Error),
}
