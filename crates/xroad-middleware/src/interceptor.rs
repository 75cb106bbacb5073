//! The interceptor trait.
//!
//! An [`Interceptor`] sees every SOAP envelope the client sends (egress) and
//! receives (ingress). Interceptors run synchronously on the calling task
//! and must be idempotent: the client may run a hook more than once on the
//! same message.
//!
//! # Example
//!
//! ```
//! use http::HeaderMap;
//! use xroad_core::xml::Element;
//! use xroad_middleware::{BindingOptions, Interceptor};
//!
//! struct Tagging;
//!
//! impl Interceptor for Tagging {
//!     fn name(&self) -> &'static str {
//!         "tagging"
//!     }
//!
//!     fn egress(&self, _envelope: &mut Element, headers: &mut HeaderMap, _binding: &mut BindingOptions) {
//!         headers.insert("x-tag", http::HeaderValue::from_static("1"));
//!     }
//! }
//! ```

use http::HeaderMap;
use xroad_core::xml::Element;

/// Transport settings an interceptor may rewrite before a message is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingOptions {
    /// Endpoint the envelope is posted to.
    pub address: Option<String>,
}

impl BindingOptions {
    /// Options pointing at `address`.
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }
}

/// Hooks around every SOAP exchange.
///
/// Both hooks default to passing the message through unchanged.
pub trait Interceptor: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Runs on an outgoing envelope before it is posted.
    fn egress(&self, envelope: &mut Element, headers: &mut HeaderMap, binding: &mut BindingOptions) {
        let _ = (envelope, headers, binding);
    }

    /// Runs on an incoming envelope before it is handed to the caller.
    fn ingress(&self, envelope: &mut Element, headers: &HeaderMap) {
        let _ = (envelope, headers);
    }
}
