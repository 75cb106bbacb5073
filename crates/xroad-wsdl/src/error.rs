//! Service-description error types.

use thiserror::Error;
use xroad_core::XRoadError;

/// Result type alias using [`WsdlError`].
pub type WsdlResult<T> = Result<T, WsdlError>;

/// Errors raised while fetching, patching or reading a service description.
#[derive(Debug, Error)]
pub enum WsdlError {
    /// Non-2xx status or transport failure.
    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// HTTP status, when a response arrived.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// The patched document could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is well-formed but not a usable service description.
    #[error("Schema error: {message}")]
    Schema {
        /// Error message.
        message: String,
    },

    /// Identity or URL error from the core.
    #[error(transparent)]
    Core(XRoadError),
}

impl WsdlError {
    /// Creates a fetch error.
    #[must_use]
    pub fn fetch(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a schema error.
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }
}

impl From<XRoadError> for WsdlError {
    fn from(err: XRoadError) -> Self {
        match err {
            XRoadError::Xml(message) => Self::Xml(message),
            other => Self::Core(other),
        }
    }
}
