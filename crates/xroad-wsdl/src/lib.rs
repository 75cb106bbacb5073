//! # X-Road WSDL
//!
//! Service-description handling for the X-Road adapter.
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`WsdlLoader`] | GET a description, consulting a [`xroad_cache::WsdlCache`] first |
//! | [`SchemaPatcher`] | Rename the top-level service, drop empty operations |
//! | [`WsdlDocument`] | Service names, address, messages and operations |
//! | [`SchemaModel`] | Compiled XML Schema types |
//! | [`SchemaWalker`] | Expand a type into a JSON description or payload template |
//!
//! # Example
//!
//! ```no_run
//! use xroad_wsdl::{input_skeleton, SchemaModel, WsdlDocument, WsdlLoader};
//!
//! # async fn example() -> xroad_wsdl::WsdlResult<()> {
//! let loader = WsdlLoader::new(reqwest::Client::new());
//! let bytes = loader.load("https://ss.example/wsdl?serviceCode=getData").await?;
//!
//! let doc = WsdlDocument::parse(&bytes)?;
//! let model = SchemaModel::from_wsdl(&doc);
//! println!("{}", input_skeleton(&doc, &model, "getData")?);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/xroad-wsdl/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod document;
mod error;
mod loader;
mod patcher;
mod schema;
mod walker;

pub use document::{MessagePart, Operation, WsdlDocument};
pub use error::{WsdlError, WsdlResult};
pub use loader::WsdlLoader;
pub use patcher::{SchemaPatcher, PATCHED_FILE_PREFIX};
pub use schema::{ComplexType, ElementDecl, MaxOccurs, SchemaModel, TypeRef};
pub use walker::{
    describe_input, describe_output, input_skeleton, SchemaWalker, WalkMode, DEFAULT_MAX_DEPTH,
};
