//! # X-Road Test
//!
//! Test utilities for the X-Road adapter.
//!
//! [`MockSecurityServer`] is a real HTTP/1.1 server bound to an ephemeral
//! localhost port. Tests register canned responses per method and path,
//! point a client at [`MockSecurityServer::url`], and inspect the
//! [`RecordedRequest`]s afterwards.
//!
//! ## Example
//!
//! ```ignore
//! use xroad_test::{fixtures, MockResponse, MockSecurityServer};
//!
//! #[tokio::test]
//! async fn fetches_wsdl() {
//!     let server = MockSecurityServer::start().await.unwrap();
//!     server.mock("GET", "/wsdl", MockResponse::xml(fixtures::GET_DATA_WSDL));
//!
//!     // ... run the code under test against server.url() ...
//!
//!     assert_eq!(server.requests_to("/wsdl").len(), 1);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/xroad-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod fixtures;
mod server;

pub use error::TestError;
pub use server::{MockResponse, MockSecurityServer, RecordedRequest};
