//! Per-client X-Road header values.

use http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{XRoadError, XRoadResult};
use crate::identity::MemberIdentity;
use crate::namespaces::{
    IDENTIFIERS, IDENTIFIERS_PREFIX, SOAP_ENV, SOAP_ENV_PREFIX, XROAD, XROAD_PREFIX,
};
use crate::xml::Element;

/// Protocol version sent when none is configured.
pub const DEFAULT_PROTOCOL_VERSION: &str = "4.0";

/// Per-call override argument for the message id.
pub const OVERRIDE_ID: &str = "xroad_id";
/// Per-call override argument for the issue reference.
pub const OVERRIDE_ISSUE: &str = "xroad_issue";
/// Per-call override argument for purpose ids.
pub const OVERRIDE_PURPOSE_ID: &str = "xroad_purposeID";

/// REST header names.
pub mod rest_headers {
    /// Client subsystem path.
    pub const CLIENT: &str = "x-road-client";
    /// Target service path.
    pub const SERVICE: &str = "x-road-service";
    /// Message id.
    pub const ID: &str = "x-road-id";
    /// End user id.
    pub const USER_ID: &str = "x-road-userid";
    /// Issue reference.
    pub const ISSUE: &str = "x-road-issue";
    /// Comma separated purpose ids.
    pub const PURPOSE_IDS: &str = "x-road-purpose-ids";
}

/// Generates a fresh opaque message id.
pub fn new_message_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Returns true for empty text or a zero-filled placeholder such as `0000000000`.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.chars().all(|c| c == '0')
}

/// Header values owned by a single client instance.
///
/// Cloned per outgoing call, so concurrent requests never observe each
/// other's minted ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderState {
    client: MemberIdentity,
    service: MemberIdentity,
    user_id: Option<String>,
    id: Option<String>,
    protocol_version: String,
    issue: Option<String>,
    purpose_ids: Vec<String>,
}

impl HeaderState {
    /// Creates header state with defaults derived from the client identity.
    pub fn new(client: MemberIdentity, service: MemberIdentity) -> Self {
        let user_id = client.subsystem_code().map(str::to_string);
        Self {
            client,
            service,
            user_id,
            id: None,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            issue: None,
            purpose_ids: Vec::new(),
        }
    }

    /// Overrides the protocol version.
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Client subsystem identity.
    pub fn client(&self) -> &MemberIdentity {
        &self.client
    }

    /// Target service identity.
    pub fn service(&self) -> &MemberIdentity {
        &self.service
    }

    /// Explicit message id, if one was set.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Sets the message id. A placeholder clears it.
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = (!is_placeholder(&id)).then_some(id);
    }

    /// End user id.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Sets the end user id.
    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.user_id = Some(user_id.into());
    }

    /// Issue reference.
    pub fn issue(&self) -> Option<&str> {
        self.issue.as_deref()
    }

    /// Sets the issue reference.
    pub fn set_issue(&mut self, issue: impl Into<String>) {
        self.issue = Some(issue.into());
    }

    /// Purpose ids.
    pub fn purpose_ids(&self) -> &[String] {
        &self.purpose_ids
    }

    /// Replaces the purpose ids.
    pub fn set_purpose_ids<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.purpose_ids = ids.into_iter().map(Into::into).collect();
    }

    /// Protocol version.
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Pulls `xroad_id`, `xroad_issue` and `xroad_purposeID` out of call arguments.
    ///
    /// The keys are always removed. Non-empty values update this state and
    /// stay in effect for later calls.
    pub fn apply_overrides(&mut self, args: &mut Map<String, Value>) {
        if let Some(id) = args.remove(OVERRIDE_ID).and_then(scalar_text) {
            self.set_id(id);
        }
        if let Some(issue) = args.remove(OVERRIDE_ISSUE).and_then(scalar_text) {
            self.set_issue(issue);
        }
        if let Some(value) = args.remove(OVERRIDE_PURPOSE_ID) {
            let ids: Vec<String> = match value {
                Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
                other => scalar_text(other).into_iter().collect(),
            };
            if !ids.is_empty() {
                self.purpose_ids = ids;
            }
        }
    }

    /// Renders the full `soapenv:Header` element.
    ///
    /// An unset id is rendered empty; the egress hook fills it in.
    pub fn to_soap_header(&self) -> Element {
        let mut header = Element::qualified(SOAP_ENV, SOAP_ENV_PREFIX, "Header")
            .with_namespace(XROAD_PREFIX, XROAD)
            .with_namespace(IDENTIFIERS_PREFIX, IDENTIFIERS);

        header.push(self.client.to_header_element("client"));
        header.push(self.service.to_header_element("service"));
        header.push(xro("userId", self.user_id.as_deref().unwrap_or_default()));
        header.push(xro("id", self.id.as_deref().unwrap_or_default()));
        header.push(xro("protocolVersion", &self.protocol_version));
        if let Some(issue) = &self.issue {
            header.push(xro("issue", issue));
        }
        header
    }

    /// Renders the REST header set. A fresh id is minted when none is set.
    pub fn to_rest_headers(&self) -> XRoadResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        insert(&mut headers, rest_headers::CLIENT, &self.client.to_string())?;
        insert(&mut headers, rest_headers::SERVICE, &self.service.to_string())?;
        let id = self.id.clone().unwrap_or_else(new_message_id);
        insert(&mut headers, rest_headers::ID, &id)?;
        if let Some(user_id) = &self.user_id {
            insert(&mut headers, rest_headers::USER_ID, user_id)?;
        }
        if let Some(issue) = &self.issue {
            insert(&mut headers, rest_headers::ISSUE, issue)?;
        }
        if !self.purpose_ids.is_empty() {
            insert(&mut headers, rest_headers::PURPOSE_IDS, &self.purpose_ids.join(","))?;
        }
        Ok(headers)
    }
}

fn xro(name: &str, text: &str) -> Element {
    Element::qualified(XROAD, XROAD_PREFIX, name).with_text(text)
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> XRoadResult<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| XRoadError::validation_with_field(format!("invalid header value: {value}"), name))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

fn scalar_text(value: Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::identity::ObjectType;

    fn state() -> HeaderState {
        HeaderState::new(
            MemberIdentity::parse(ObjectType::Subsystem, "EE/GOV/1234/SUB").unwrap(),
            MemberIdentity::parse(ObjectType::Service, "EE/GOV/5678/SUB/getData/v1").unwrap(),
        )
    }

    #[test]
    fn test_defaults() {
        let state = state();
        assert_eq!(state.user_id(), Some("SUB"));
        assert_eq!(state.id(), None);
        assert_eq!(state.protocol_version(), "4.0");
        assert!(state.issue().is_none());
        assert!(state.purpose_ids().is_empty());
    }

    #[test]
    fn test_user_id_absent_without_subsystem() {
        let state = HeaderState::new(
            MemberIdentity::parse(ObjectType::Subsystem, "EE/GOV/1234").unwrap(),
            MemberIdentity::parse(ObjectType::Service, "EE/GOV/5678/SUB/getData").unwrap(),
        );
        assert_eq!(state.user_id(), None);
    }

    #[test]
    fn test_placeholder() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("   "));
        assert!(is_placeholder("0"));
        assert!(is_placeholder("0000000000"));
        assert!(!is_placeholder("100"));
        assert!(!is_placeholder("abc"));
    }

    #[test]
    fn test_message_ids_are_fresh() {
        let a = new_message_id();
        let b = new_message_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(!is_placeholder(&a));
    }

    #[test]
    fn test_set_id_placeholder_clears() {
        let mut state = state();
        state.set_id("abc");
        assert_eq!(state.id(), Some("abc"));
        state.set_id("0000");
        assert_eq!(state.id(), None);
    }

    #[test]
    fn test_apply_overrides_removes_keys() {
        let mut state = state();
        let mut args = json!({
            "xroad_id": "req-1",
            "xroad_issue": "ISSUE-7",
            "xroad_purposeID": ["p1", "p2"],
            "code": 42
        })
        .as_object()
        .cloned()
        .unwrap();

        state.apply_overrides(&mut args);

        assert_eq!(args.len(), 1);
        assert!(args.contains_key("code"));
        assert_eq!(state.id(), Some("req-1"));
        assert_eq!(state.issue(), Some("ISSUE-7"));
        assert_eq!(state.purpose_ids(), ["p1".to_string(), "p2".to_string()]);
    }

    #[test]
    fn test_apply_overrides_persist_and_ignore_empty() {
        let mut state = state();
        let mut first = json!({"xroad_issue": "A"}).as_object().cloned().unwrap();
        state.apply_overrides(&mut first);

        let mut second = json!({"xroad_issue": "", "xroad_purposeID": "p9"})
            .as_object()
            .cloned()
            .unwrap();
        state.apply_overrides(&mut second);

        assert!(second.is_empty());
        assert_eq!(state.issue(), Some("A"));
        assert_eq!(state.purpose_ids(), ["p9".to_string()]);
    }

    #[test]
    fn test_soap_header() {
        let mut state = state();
        state.set_issue("ISSUE-1");
        let header = state.to_soap_header();

        assert!(header.is(SOAP_ENV, "Header"));
        let client = header.child(XROAD, "client").unwrap();
        assert_eq!(client.attribute("objectType"), Some("SUBSYSTEM"));
        assert_eq!(client.child(IDENTIFIERS, "memberCode").unwrap().text(), "1234");
        assert_eq!(header.child(XROAD, "userId").unwrap().text(), "SUB");
        assert_eq!(header.child(XROAD, "id").unwrap().text(), "");
        assert_eq!(header.child(XROAD, "protocolVersion").unwrap().text(), "4.0");
        assert_eq!(header.child(XROAD, "issue").unwrap().text(), "ISSUE-1");

        let service = header.child(XROAD, "service").unwrap();
        assert_eq!(service.child(IDENTIFIERS, "serviceVersion").unwrap().text(), "v1");
    }

    #[test]
    fn test_rest_headers() {
        let mut state = state();
        state.set_purpose_ids(["a", "b"]);
        let headers = state.to_rest_headers().unwrap();

        assert_eq!(headers[rest_headers::CLIENT], "EE/GOV/1234/SUB");
        assert_eq!(headers[rest_headers::SERVICE], "EE/GOV/5678/SUB/getData/v1");
        assert_eq!(headers[rest_headers::USER_ID], "SUB");
        assert_eq!(headers[rest_headers::PURPOSE_IDS], "a,b");
        assert!(!headers[rest_headers::ID].is_empty());
        assert!(headers.get(rest_headers::ISSUE).is_none());
    }

    #[test]
    fn test_rest_headers_use_explicit_id() {
        let mut state = state();
        state.set_id("fixed");
        let headers = state.to_rest_headers().unwrap();
        assert_eq!(headers[rest_headers::ID], "fixed");
    }
}
