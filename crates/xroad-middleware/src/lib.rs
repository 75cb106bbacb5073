//! # X-Road Middleware
//!
//! Interceptors run around every SOAP exchange of a client.
//!
//! ```text
//! envelope → egress(a) → egress(b) → POST
//!                                      ↓
//! caller ← ingress(a) ← ingress(b) ← reply
//! ```
//!
//! | Interceptor | Purpose |
//! |-------------|---------|
//! | [`XRoadHeaderInterceptor`] | Mint `id`, default `userId`, drop WS-Addressing, force the address; strip echoed fields on replies |
//! | [`TransactionHistory`] | Remember the `uxp-transaction-id` and `Date` of the last reply |
//!
//! ## Example
//!
//! ```
//! use http::HeaderMap;
//! use xroad_core::{HeaderState, MemberIdentity, ObjectType};
//! use xroad_core::namespaces::SOAP_ENV;
//! use xroad_core::xml::Element;
//! use xroad_middleware::{BindingOptions, InterceptorChain, XRoadHeaderInterceptor};
//!
//! let client = MemberIdentity::parse(ObjectType::Subsystem, "EE/GOV/1234/SUB").unwrap();
//! let service = MemberIdentity::parse(ObjectType::Service, "EE/GOV/5678/SUB/getData").unwrap();
//! let state = HeaderState::new(client.clone(), service);
//!
//! let chain = InterceptorChain::new()
//!     .with(XRoadHeaderInterceptor::new(client, "https://ss.example"));
//!
//! let mut envelope = Element::qualified(SOAP_ENV, "soapenv", "Envelope")
//!     .with_child(state.to_soap_header());
//! let mut binding = BindingOptions::default();
//! chain.egress(&mut envelope, &mut HeaderMap::new(), &mut binding);
//!
//! assert_eq!(binding.address.as_deref(), Some("https://ss.example"));
//! ```

#![doc(html_root_url = "https://docs.rs/xroad-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod interceptor;
pub mod stages;

pub use chain::{BoxedInterceptor, InterceptorChain};
pub use interceptor::{BindingOptions, Interceptor};
pub use stages::{TransactionHistory, XRoadHeaderInterceptor};
