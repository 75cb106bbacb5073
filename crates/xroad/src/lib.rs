//! # X-Road
//!
//! **Protocol adapter for X-Road (Trembita) Security Servers**
//!
//! - **Identities** - participant and service addresses from compact paths
//!   such as `EE/GOV/1234/SUB`
//! - **Service descriptions** - URL resolution, fetching with a TTL cache
//!   (memory, Redis or SQLite), repair of malformed documents
//! - **Schema walking** - input/output descriptions and default payloads
//! - **Header handling** - X-Road SOAP header and REST headers, applied by
//!   an interceptor chain on every request
//! - **Clients** - SOAP and REST behind one [`XRoadClient`](client::XRoadClient) trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xroad::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_file("xroad.toml")?.with_env_overrides();
//!     let client = connect(&config).await?;
//!
//!     let mut args = serde_json::Map::new();
//!     args.insert("code".into(), "A-1".into());
//!     println!("{}", client.request(args).await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! args → overrides → header snapshot → envelope → egress chain → Security Server
//!                                                                     ↓
//! JSON ← schema-shaped decoding ← fault check ← ingress chain ←───────┘
//! ```

#![doc(html_root_url = "https://docs.rs/xroad/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Identities, header state, XML
pub use xroad_core as core;

// Service-description caches
pub use xroad_cache as cache;

// Service-description parsing, walking and patching
pub use xroad_wsdl as wsdl;

// Interceptor chain
pub use xroad_middleware as middleware;

// Logging and metrics
pub use xroad_telemetry as telemetry;

// SOAP and REST clients
pub use xroad_client as client;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use xroad::prelude::*;
///
/// let service = MemberIdentity::parse(ObjectType::Service, "EE/GOV/5678/SUB/getData/v1").unwrap();
/// assert_eq!(service.service_code(), Some("getData"));
/// ```
pub mod prelude {
    pub use xroad_core::{
        resolve_wsdl_url, HeaderState, MemberIdentity, ObjectType, XRoadError, XRoadResult,
    };

    pub use xroad_cache::{CacheBackend, WsdlCache};

    pub use xroad_wsdl::{SchemaPatcher, WsdlDocument, WsdlLoader};

    pub use xroad_middleware::{Interceptor, InterceptorChain};

    pub use xroad_telemetry::{init_logging, LogConfig};

    pub use xroad_client::{
        connect, ClientConfig, ClientError, ClientResult, Protocol, RestClient, SoapClient,
        XRoadClient,
    };
}
