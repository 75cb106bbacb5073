//! Error types for the X-Road core.

use thiserror::Error;

/// Result type alias using [`XRoadError`].
pub type XRoadResult<T> = Result<T, XRoadError>;

/// Errors raised while building identities, headers and envelopes.
#[derive(Debug, Error)]
pub enum XRoadError {
    /// A client or service path is missing or malformed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// The offending field, if known.
        field: Option<String>,
    },

    /// A SERVICE-only operation was invoked on a non-SERVICE identity.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Human-readable error message.
        message: String,
    },

    /// An XML document could not be parsed.
    #[error("XML error: {0}")]
    Xml(String),
}

impl XRoadError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a validation error for a named field.
    #[must_use]
    pub fn validation_with_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Returns the error category used in log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::InvalidState { .. } => "invalid_state",
            Self::Xml(_) => "xml",
        }
    }
}

impl From<roxmltree::Error> for XRoadError {
    fn from(err: roxmltree::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let err = XRoadError::validation("client - required");
        assert_eq!(err.category(), "validation");
        assert!(err.to_string().contains("client - required"));

        let err = XRoadError::validation_with_field("empty path", "service");
        match err {
            XRoadError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("service")),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = XRoadError::invalid_state("not a service");
        assert_eq!(err.category(), "invalid_state");
    }

    #[test]
    fn test_xml_conversion() {
        let err: XRoadError = roxmltree::Document::parse("<a>").unwrap_err().into();
        assert_eq!(err.category(), "xml");
    }
}
