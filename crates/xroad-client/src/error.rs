//! Error types for the X-Road clients.

use thiserror::Error;
use xroad_cache::CacheError;
use xroad_core::XRoadError;
use xroad_wsdl::WsdlError;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or malformed client/service path or configuration value.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
        /// Offending field.
        field: Option<String>,
    },

    /// The cache backend or another collaborator is misconfigured.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// The service description could not be retrieved.
    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// HTTP status, when a response arrived.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// The remote server answered with a SOAP fault.
    #[error("Remote fault {code}: {message}")]
    RemoteFault {
        /// `faultcode`.
        code: String,
        /// `faultstring`.
        message: String,
        /// Serialised `detail`, if present.
        detail: Option<String>,
    },

    /// A SERVICE-only operation was invoked on another identity.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message.
        message: String,
    },

    /// The request could not be delivered or the server answered with an error status.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// HTTP status, when a response arrived.
        status: Option<u16>,
    },

    /// The reply was not a usable message.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error with field.
    pub fn validation_with_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Create a transport error with status code.
    pub fn transport_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Transport {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// True for SOAP faults returned by the remote server.
    pub fn is_remote_fault(&self) -> bool {
        matches!(self, Self::RemoteFault { .. })
    }

    /// Get the error category for logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Configuration { .. } => "configuration",
            Self::Fetch { .. } => "fetch",
            Self::RemoteFault { .. } => "remote_fault",
            Self::InvalidState { .. } => "invalid_state",
            Self::Transport { .. } => "transport",
            Self::Protocol { .. } => "protocol",
            Self::Io(_) => "io",
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl From<XRoadError> for ClientError {
    fn from(err: XRoadError) -> Self {
        match err {
            XRoadError::Validation { message, field } => Self::Validation { message, field },
            XRoadError::InvalidState { message } => Self::InvalidState { message },
            XRoadError::Xml(message) => Self::Protocol { message },
        }
    }
}

impl From<CacheError> for ClientError {
    fn from(err: CacheError) -> Self {
        Self::configuration(err.to_string())
    }
}

impl From<WsdlError> for ClientError {
    fn from(err: WsdlError) -> Self {
        match err {
            WsdlError::Fetch { url, status, message } => Self::Fetch { url, status, message },
            WsdlError::Xml(message) => Self::protocol(format!("invalid service description: {message}")),
            WsdlError::Schema { message } => Self::protocol(message),
            WsdlError::Io(e) => Self::Io(e),
            WsdlError::Core(e) => e.into(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol(format!("invalid JSON: {err}"))
    }
}
