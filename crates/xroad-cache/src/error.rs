//! Cache error types.

use thiserror::Error;

/// Result type alias using [`CacheError`].
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend could not be set up (bad connection descriptor, unreachable store).
    #[error("Cache configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// A read or write failed after construction.
    #[error("Cache unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },
}

impl CacheError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns true if callers should treat the failure as a cache miss.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
