//! X-Road header interceptor.
//!
//! Egress:
//!
//! - an empty or zero-filled `xro:id` gets a freshly minted id
//! - an empty or zero-filled `xro:userId` gets the client's subsystem code
//! - WS-Addressing children injected by SOAP stacks are removed
//! - the binding address is forced to the Security Server URL
//!
//! Ingress strips `xro:requestHash`, `xro:protocolVersion` and `xro:issue`,
//! which some servers echo back.
//!
//! Values already present are never overwritten, so running either hook
//! again on the same message changes nothing. Envelopes without a header
//! pass through untouched.

use http::HeaderMap;
use tracing::debug;
use xroad_core::namespaces::{SOAP_ENV, WS_ADDRESSING, WS_ADDRESSING_PREFIX, XROAD, XROAD_PREFIX};
use xroad_core::xml::Element;
use xroad_core::{is_placeholder, new_message_id, MemberIdentity};

use crate::interceptor::{BindingOptions, Interceptor};

/// Header fields removed from incoming messages.
pub const ECHOED_FIELDS: [&str; 3] = ["requestHash", "protocolVersion", "issue"];

/// Fills and cleans the X-Road SOAP header.
#[derive(Debug, Clone)]
pub struct XRoadHeaderInterceptor {
    client: MemberIdentity,
    security_server_url: String,
}

impl XRoadHeaderInterceptor {
    /// Creates the interceptor for `client`, posting to `security_server_url`.
    pub fn new(client: MemberIdentity, security_server_url: impl Into<String>) -> Self {
        Self {
            client,
            security_server_url: security_server_url.into(),
        }
    }

    /// The forced endpoint.
    pub fn security_server_url(&self) -> &str {
        &self.security_server_url
    }
}

impl Interceptor for XRoadHeaderInterceptor {
    fn name(&self) -> &'static str {
        "xroad_header"
    }

    fn egress(&self, envelope: &mut Element, _headers: &mut HeaderMap, binding: &mut BindingOptions) {
        if binding.address.as_deref() != Some(self.security_server_url.as_str()) {
            debug!(
                from = binding.address.as_deref().unwrap_or_default(),
                to = %self.security_server_url,
                "forcing binding address"
            );
            binding.address = Some(self.security_server_url.clone());
        }

        let Some(header) = envelope.child_mut(SOAP_ENV, "Header") else {
            return;
        };

        if fill_placeholder(header, "id", new_message_id) {
            debug!("assigned message id");
        }
        if let Some(subsystem) = self.client.subsystem_code() {
            if fill_placeholder(header, "userId", || subsystem.to_string()) {
                debug!(user_id = subsystem, "assigned user id");
            }
        }

        let removed = header.remove_children(|child| {
            child.namespace() == Some(WS_ADDRESSING) || child.prefix() == Some(WS_ADDRESSING_PREFIX)
        });
        if removed > 0 {
            debug!(removed, "removed addressing headers");
        }
    }

    fn ingress(&self, envelope: &mut Element, _headers: &HeaderMap) {
        let Some(header) = envelope.child_mut(SOAP_ENV, "Header") else {
            return;
        };

        let removed = header
            .remove_children(|child| ECHOED_FIELDS.iter().any(|name| child.is(XROAD, name)));
        if removed > 0 {
            debug!(removed, "stripped echoed header fields");
        }
    }
}

/// Sets `xro:<name>` when it is missing or a placeholder. Returns true if it changed.
fn fill_placeholder(header: &mut Element, name: &str, value: impl FnOnce() -> String) -> bool {
    match header.child_mut(XROAD, name) {
        Some(field) if is_placeholder(&field.text()) => {
            field.set_text(value());
            true
        }
        Some(_) => false,
        None => {
            header.push(Element::qualified(XROAD, XROAD_PREFIX, name).with_text(value()));
            true
        }
    }
}
