//! Service-description URL resolution.

use crate::error::XRoadResult;
use crate::identity::MemberIdentity;

/// Builds `<base_url>/wsdl?<query>` for a service identity.
///
/// A base URL that already points at a `wsdl` resource is returned
/// unchanged, which makes resolution idempotent and lets callers pass a
/// pre-resolved address. The output is used as a cache key, so it must be
/// byte-stable for equal inputs.
pub fn resolve_wsdl_url(base_url: &str, service: &MemberIdentity) -> XRoadResult<String> {
    if is_resolved_wsdl_url(base_url) {
        return Ok(base_url.to_string());
    }

    let query = service.service_wsdl_path()?;
    Ok(format!("{}/wsdl?{query}", base_url.trim_end_matches('/')))
}

/// Returns true if the URL path already contains a `wsdl` segment.
pub fn is_resolved_wsdl_url(url: &str) -> bool {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => without_query,
    };
    path.split('/').any(|segment| segment == "wsdl")
}
