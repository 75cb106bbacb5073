//! Service-description repair.
//!
//! Some Security Servers publish descriptions whose top-level service name
//! is generated and does not match the service being called, or whose port
//! types advertise operations with neither input nor output. Both break
//! binding lookup, so the patcher renames every top-level `wsdl:service` to
//! the expected name and drops the empty operations.

use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info};
use xroad_core::namespaces::WSDL;
use xroad_core::xml::Element;

use crate::error::{WsdlError, WsdlResult};
use crate::loader::fetch;

/// Prefix of the temporary files written by [`SchemaPatcher::fetch_and_patch`].
pub const PATCHED_FILE_PREFIX: &str = "xroad-wsdl-";

/// Fetches and repairs service descriptions.
#[derive(Debug, Clone)]
pub struct SchemaPatcher {
    http: reqwest::Client,
}

impl SchemaPatcher {
    /// Creates a patcher using the given HTTP client.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Patches an in-memory document.
    pub fn patch(bytes: &[u8], service_name: &str) -> WsdlResult<Vec<u8>> {
        let mut root = Element::parse_bytes(bytes)?;
        if !root.is(WSDL, "definitions") {
            return Err(WsdlError::schema(format!(
                "expected wsdl:definitions, found {}",
                root.local_name()
            )));
        }

        for service in root.elements_mut().filter(|el| el.is(WSDL, "service")) {
            if service.attribute("name") != Some(service_name) {
                debug!(
                    from = service.attribute("name").unwrap_or_default(),
                    to = service_name,
                    "renaming service"
                );
                service.set_attribute("name", service_name);
            }
        }

        for port_type in root.elements_mut().filter(|el| el.is(WSDL, "portType")) {
            let removed = port_type.remove_children(|op| {
                op.is(WSDL, "operation")
                    && op.child(WSDL, "input").is_none()
                    && op.child(WSDL, "output").is_none()
            });
            if removed > 0 {
                debug!(
                    port_type = port_type.attribute("name").unwrap_or_default(),
                    removed, "dropped operations without messages"
                );
            }
        }

        Ok(root.to_document().into_bytes())
    }

    /// Fetches `url`, patches it and writes the result to a new temporary file.
    ///
    /// Every call creates a new file; removing it is up to the caller.
    pub async fn fetch_and_patch(&self, url: &str, service_name: &str) -> WsdlResult<PathBuf> {
        let body = fetch(&self.http, url).await?;
        let patched = Self::patch(&body, service_name)?;

        let mut file = tempfile::Builder::new()
            .prefix(PATCHED_FILE_PREFIX)
            .suffix(".xml")
            .tempfile()?;
        file.write_all(&patched)?;
        let path = file.into_temp_path().keep().map_err(|e| e.error)?;

        info!(url = %url, path = %path.display(), service = service_name, "patched service description");
        Ok(path)
    }
}
