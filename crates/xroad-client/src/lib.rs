//! # X-Road Client
//!
//! SOAP and REST clients for services published through an X-Road (Trembita)
//! Security Server.
//!
//! [`connect`] reads a [`ClientConfig`] and returns the client matching its
//! protocol behind the object-safe [`XRoadClient`] trait:
//!
//! - [`SoapClient`] - loads the service description, builds envelopes with the
//!   X-Road header and decodes replies into JSON shaped by the schema
//! - [`RestClient`] - sends the X-Road REST headers to `{security server}/restapi`
//!
//! # Example
//!
//! ```no_run
//! use serde_json::{json, Map, Value};
//! use xroad_client::{connect, ClientConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::builder()
//!     .security_server_url("https://ss.example")
//!     .client("EE/GOV/1234/SUB")
//!     .service("EE/GOV/5678/SUB/getData/v1")
//!     .build()?;
//!
//! let client = connect(&config).await?;
//! client.set_issue("ISSUE-1");
//!
//! let args: Map<String, Value> = json!({"code": "A-1"}).as_object().cloned().unwrap_or_default();
//! let reply = client.request(args).await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/xroad-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod envelope;
mod error;
mod header;
mod rest;
mod soap;

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use xroad_core::MemberIdentity;

pub use config::{
    CacheKind, CacheSettings, ClientConfig, ClientConfigBuilder, ClientSettings, Protocol,
    SecurityServerSettings,
};
pub use envelope::{body_payload, build_envelope, element_to_json, extract_fault, Fault, TARGET_PREFIX};
pub use error::{ClientError, ClientResult};
pub use header::SharedHeader;
pub use rest::{RestClient, REST_PATH};
pub use soap::{SoapClient, LIST_METHODS};

/// A boxed future for async client methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A configured client for one X-Road service.
///
/// Header setters apply to every later request on the same instance. Each
/// request works on a snapshot of the header, so concurrent requests do
/// not interfere.
pub trait XRoadClient: Send + Sync + std::fmt::Debug {
    /// The header state shared by all requests of this client.
    fn header(&self) -> &SharedHeader;

    /// Invokes the service with `args`.
    ///
    /// The reserved keys `xroad_id`, `xroad_issue` and `xroad_purposeID` are
    /// removed from `args` and update the header first.
    fn request<'a>(&'a self, args: Map<String, Value>) -> BoxFuture<'a, ClientResult<Value>>;

    /// Client identity.
    fn client(&self) -> &MemberIdentity {
        self.header().client()
    }

    /// Service identity.
    fn service(&self) -> &MemberIdentity {
        self.header().service()
    }

    /// The explicit message id, if one is set.
    fn id(&self) -> Option<String> {
        self.header().snapshot().id().map(str::to_string)
    }

    /// Sets the message id. A placeholder value clears it.
    fn set_id(&self, id: &str) {
        self.header().update(|state| state.set_id(id));
    }

    /// End user id.
    fn user_id(&self) -> Option<String> {
        self.header().snapshot().user_id().map(str::to_string)
    }

    /// Sets the end user id.
    fn set_user_id(&self, user_id: &str) {
        self.header().update(|state| state.set_user_id(user_id));
    }

    /// Issue reference.
    fn issue(&self) -> Option<String> {
        self.header().snapshot().issue().map(str::to_string)
    }

    /// Sets the issue reference.
    fn set_issue(&self, issue: &str) {
        self.header().update(|state| state.set_issue(issue));
    }

    /// Purpose ids.
    fn purpose_ids(&self) -> Vec<String> {
        self.header().snapshot().purpose_ids().to_vec()
    }

    /// Replaces the purpose ids.
    fn set_purpose_ids(&self, ids: &[String]) {
        self.header().update(|state| state.set_purpose_ids(ids.iter().cloned()));
    }
}

/// Builds the client selected by `config.client.protocol`.
pub async fn connect(config: &ClientConfig) -> ClientResult<Box<dyn XRoadClient>> {
    Ok(match config.client.protocol {
        Protocol::Soap => Box::new(SoapClient::connect(config).await?),
        Protocol::Rest => Box::new(RestClient::connect(config)?),
    })
}
