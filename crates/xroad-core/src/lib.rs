//! # X-Road Core
//!
//! Core types shared by every crate of the X-Road (Trembita) protocol adapter.
//!
//! - [`MemberIdentity`] - participant / service address parsed from a path
//! - [`resolve_wsdl_url`] - canonical service-description URL for a service
//! - [`HeaderState`] - the X-Road header values attached to an outgoing client
//! - [`xml::Element`] - owned, namespace-aware XML used for SOAP envelopes
//! - [`XRoadError`] - validation and state errors
//!
//! # Example
//!
//! ```
//! use xroad_core::{resolve_wsdl_url, MemberIdentity, ObjectType};
//!
//! let service = MemberIdentity::parse(ObjectType::Service, "EE/GOV/5678/SUB/getData/v1").unwrap();
//! let url = resolve_wsdl_url("https://ss.example", &service).unwrap();
//! assert_eq!(
//!     url,
//!     "https://ss.example/wsdl?xRoadInstance=EE&memberClass=GOV&memberCode=5678\
//!      &subsystemCode=SUB&serviceCode=getData&version=v1"
//! );
//! ```

#![doc(html_root_url = "https://docs.rs/xroad-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod header;
mod identity;
pub mod namespaces;
mod resolver;
pub mod xml;

pub use error::{XRoadError, XRoadResult};
pub use header::{
    is_placeholder, new_message_id, rest_headers, HeaderState, DEFAULT_PROTOCOL_VERSION,
    OVERRIDE_ID, OVERRIDE_ISSUE, OVERRIDE_PURPOSE_ID,
};
pub use identity::{AddressField, MemberIdentity, ObjectType};
pub use resolver::{is_resolved_wsdl_url, resolve_wsdl_url};
