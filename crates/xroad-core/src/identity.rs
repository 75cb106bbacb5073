//! X-Road participant and service identifiers.
//!
//! A [`MemberIdentity`] is built from a compact slash-delimited path such as
//! `EE/GOV/1234/SUB` (a client subsystem) or `EE/GOV/5678/SUB/getData/v1`
//! (a service). Segments fill the address fields strictly left to right in
//! the order given by [`AddressField::ALL`]; fields past the end of the path
//! stay absent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{XRoadError, XRoadResult};
use crate::namespaces::{IDENTIFIERS, IDENTIFIERS_PREFIX, XROAD, XROAD_PREFIX};
use crate::xml::Element;

/// The kind of identifier, supplied by the caller's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectType {
    /// A client subsystem.
    Subsystem,
    /// A service (target of a request).
    Service,
}

impl ObjectType {
    /// Wire representation (`SUBSYSTEM` / `SERVICE`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Subsystem => "SUBSYSTEM",
            Self::Service => "SERVICE",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = XRoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUBSYSTEM" => Ok(Self::Subsystem),
            "SERVICE" => Ok(Self::Service),
            other => Err(XRoadError::validation_with_field(
                format!("unknown object type: {other}"),
                "objectType",
            )),
        }
    }
}

/// Address fields in their fixed wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    /// `xRoadInstance`
    XRoadInstance,
    /// `memberClass`
    MemberClass,
    /// `memberCode`
    MemberCode,
    /// `subsystemCode`
    SubsystemCode,
    /// `serviceCode`
    ServiceCode,
    /// `serviceVersion`
    ServiceVersion,
}

impl AddressField {
    /// All fields, in the order path segments populate them.
    pub const ALL: [AddressField; 6] = [
        Self::XRoadInstance,
        Self::MemberClass,
        Self::MemberCode,
        Self::SubsystemCode,
        Self::ServiceCode,
        Self::ServiceVersion,
    ];

    /// Field name as used in header elements.
    pub const fn name(self) -> &'static str {
        match self {
            Self::XRoadInstance => "xRoadInstance",
            Self::MemberClass => "memberClass",
            Self::MemberCode => "memberCode",
            Self::SubsystemCode => "subsystemCode",
            Self::ServiceCode => "serviceCode",
            Self::ServiceVersion => "serviceVersion",
        }
    }

    /// Field name as used in the service-description query string.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::ServiceVersion => "version",
            other => other.name(),
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// An X-Road participant or service address.
///
/// Immutable once parsed.
///
/// # Example
///
/// ```
/// use xroad_core::{AddressField, MemberIdentity, ObjectType};
///
/// let client = MemberIdentity::parse(ObjectType::Subsystem, "EE/GOV/1234/SUB").unwrap();
/// assert_eq!(client.member_code(), Some("1234"));
/// assert_eq!(client.get(AddressField::ServiceCode), None);
/// assert_eq!(client.to_string(), "EE/GOV/1234/SUB");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberIdentity {
    object_type: ObjectType,
    segments: Vec<String>,
}

impl MemberIdentity {
    /// Parses a slash-delimited path.
    ///
    /// Segments beyond the sixth are ignored. An empty path is rejected.
    pub fn parse(object_type: ObjectType, path: &str) -> XRoadResult<Self> {
        let field = match object_type {
            ObjectType::Subsystem => "client",
            ObjectType::Service => "service",
        };
        if path.trim().is_empty() {
            return Err(XRoadError::validation_with_field(
                format!("{field} - required"),
                field,
            ));
        }

        let mut segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if segments.len() > AddressField::ALL.len() {
            debug!(
                path = %path,
                dropped = segments.len() - AddressField::ALL.len(),
                "ignoring extra identifier segments"
            );
            segments.truncate(AddressField::ALL.len());
        }

        Ok(Self {
            object_type,
            segments,
        })
    }

    /// The caller-supplied object type.
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    /// Returns a field value, or `None` when the path did not reach it.
    pub fn get(&self, field: AddressField) -> Option<&str> {
        self.segments.get(field.index()).map(String::as_str)
    }

    /// `xRoadInstance`
    pub fn x_road_instance(&self) -> Option<&str> {
        self.get(AddressField::XRoadInstance)
    }

    /// `memberClass`
    pub fn member_class(&self) -> Option<&str> {
        self.get(AddressField::MemberClass)
    }

    /// `memberCode`
    pub fn member_code(&self) -> Option<&str> {
        self.get(AddressField::MemberCode)
    }

    /// `subsystemCode`
    pub fn subsystem_code(&self) -> Option<&str> {
        self.get(AddressField::SubsystemCode)
    }

    /// `serviceCode`
    pub fn service_code(&self) -> Option<&str> {
        self.get(AddressField::ServiceCode)
    }

    /// `serviceVersion`
    pub fn service_version(&self) -> Option<&str> {
        self.get(AddressField::ServiceVersion)
    }

    /// Populated, non-empty fields in wire order.
    pub fn address_fields(&self) -> Vec<(AddressField, &str)> {
        AddressField::ALL
            .iter()
            .filter_map(|field| {
                self.get(*field)
                    .filter(|v| !v.is_empty())
                    .map(|v| (*field, v))
            })
            .collect()
    }

    /// Populated fields by name, followed by `objectType`.
    ///
    /// Shared by the query-string and header renderings so both agree.
    pub fn to_address_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields: Vec<(&'static str, &str)> = self
            .address_fields()
            .into_iter()
            .map(|(field, value)| (field.name(), value))
            .collect();
        fields.push(("objectType", self.object_type.as_str()));
        fields
    }

    /// Renders the service-description query string.
    ///
    /// Only valid for [`ObjectType::Service`] identities.
    pub fn service_wsdl_path(&self) -> XRoadResult<String> {
        if self.object_type != ObjectType::Service {
            return Err(XRoadError::invalid_state(
                "wsdl path is only available for SERVICE objectType",
            ));
        }

        Ok(self
            .address_fields()
            .into_iter()
            .map(|(field, value)| format!("{}={}", field.wire_name(), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&"))
    }

    /// Resolves the service-description URL against a Security Server address.
    pub fn wsdl_url(&self, base_url: &str) -> XRoadResult<String> {
        crate::resolver::resolve_wsdl_url(base_url, self)
    }

    /// Renders the identifier as an `xro:<tag>` header block.
    pub fn to_header_element(&self, tag: &str) -> Element {
        let mut element = Element::qualified(XROAD, XROAD_PREFIX, tag).with_qualified_attribute(
            IDENTIFIERS,
            IDENTIFIERS_PREFIX,
            "objectType",
            self.object_type.as_str(),
        );
        for (field, value) in self.address_fields() {
            element.push(Element::qualified(IDENTIFIERS, IDENTIFIERS_PREFIX, field.name()).with_text(value));
        }
        element
    }

    /// Reads an identifier back from an `xro:client` / `xro:service` block.
    pub fn from_header_element(element: &Element) -> XRoadResult<Self> {
        let object_type = element
            .attribute("objectType")
            .ok_or_else(|| XRoadError::validation_with_field("missing objectType", "objectType"))?
            .parse()?;

        // Fields are read by name; a gap before a later field is an empty segment.
        let mut segments: Vec<String> = AddressField::ALL
            .iter()
            .map(|field| {
                element
                    .child(IDENTIFIERS, field.name())
                    .map(Element::text)
                    .unwrap_or_default()
            })
            .collect();
        let populated = AddressField::ALL
            .iter()
            .rposition(|field| element.child(IDENTIFIERS, field.name()).is_some())
            .map_or(0, |last| last + 1);
        segments.truncate(populated);

        Ok(Self {
            object_type,
            segments,
        })
    }
}

impl fmt::Display for MemberIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_path() {
        let member = MemberIdentity::parse(
            ObjectType::Service,
            "instance/class/code/subsystem/service/serviceVersion",
        )
        .unwrap();

        assert_eq!(member.x_road_instance(), Some("instance"));
        assert_eq!(member.member_class(), Some("class"));
        assert_eq!(member.member_code(), Some("code"));
        assert_eq!(member.subsystem_code(), Some("subsystem"));
        assert_eq!(member.service_code(), Some("service"));
        assert_eq!(member.service_version(), Some("serviceVersion"));
    }

    #[test]
    fn test_partial_path() {
        let member = MemberIdentity::parse(ObjectType::Service, "instance/class").unwrap();

        assert_eq!(member.x_road_instance(), Some("instance"));
        assert_eq!(member.member_class(), Some("class"));
        assert!(member.member_code().is_none());
        assert!(member.subsystem_code().is_none());
        assert!(member.service_code().is_none());
        assert!(member.service_version().is_none());
    }

    #[test]
    fn test_extra_segments_are_dropped() {
        let member = MemberIdentity::parse(ObjectType::Service, "a/b/c/d/e/f/g/h").unwrap();
        assert_eq!(member.service_version(), Some("f"));
        assert_eq!(member.to_string(), "a/b/c/d/e/f");
    }

    #[test]
    fn test_empty_path_rejected() {
        let err = MemberIdentity::parse(ObjectType::Subsystem, "  ").unwrap_err();
        assert!(err.to_string().contains("client - required"));
    }

    #[test]
    fn test_wsdl_path() {
        let member = MemberIdentity::parse(
            ObjectType::Service,
            "instance/class/code/subsystem/service/serviceVersion",
        )
        .unwrap();
        assert_eq!(
            member.service_wsdl_path().unwrap(),
            "xRoadInstance=instance&memberClass=class&memberCode=code\
             &subsystemCode=subsystem&serviceCode=service&version=serviceVersion"
        );
    }

    #[test]
    fn test_wsdl_path_omits_absent_and_empty_fields() {
        let member = MemberIdentity::parse(ObjectType::Service, "EE//1234/SUB/getData").unwrap();
        assert_eq!(
            member.service_wsdl_path().unwrap(),
            "xRoadInstance=EE&memberCode=1234&subsystemCode=SUB&serviceCode=getData"
        );
    }

    #[test]
    fn test_wsdl_path_encodes_values() {
        let member = MemberIdentity::parse(ObjectType::Service, "EE/GOV/12 34/SUB/get&Data").unwrap();
        assert_eq!(
            member.service_wsdl_path().unwrap(),
            "xRoadInstance=EE&memberClass=GOV&memberCode=12%2034&subsystemCode=SUB&serviceCode=get%26Data"
        );
    }

    #[test]
    fn test_wsdl_path_only_for_service() {
        let member = MemberIdentity::parse(ObjectType::Subsystem, "EE/GOV/1234/SUB").unwrap();
        let err = member.service_wsdl_path().unwrap_err();
        assert!(matches!(err, XRoadError::InvalidState { .. }));
    }

    #[test]
    fn test_address_fields_object_type_last() {
        let member = MemberIdentity::parse(ObjectType::Subsystem, "EE/GOV/1234/SUB").unwrap();
        assert_eq!(
            member.to_address_fields(),
            vec![
                ("xRoadInstance", "EE"),
                ("memberClass", "GOV"),
                ("memberCode", "1234"),
                ("subsystemCode", "SUB"),
                ("objectType", "SUBSYSTEM"),
            ]
        );
    }

    #[test]
    fn test_header_element_roundtrip() {
        let member = MemberIdentity::parse(ObjectType::Service, "EE/GOV/5678/SUB/getData/v1").unwrap();
        let element = member.to_header_element("service");
        let xml = element.to_xml();
        assert!(xml.starts_with("<xro:service"));
        assert!(xml.contains(r#"iden:objectType="SERVICE""#));
        assert!(xml.contains("<iden:serviceVersion>v1</iden:serviceVersion>"));

        let parsed = MemberIdentity::from_header_element(&Element::parse(&xml).unwrap()).unwrap();
        assert_eq!(parsed, member);
    }

    #[test]
    fn test_header_element_roundtrip_with_empty_segment() {
        let member = MemberIdentity::parse(ObjectType::Subsystem, "EE//1234/SUB").unwrap();
        let xml = member.to_header_element("client").to_xml();
        assert!(!xml.contains("memberClass"));

        let parsed = MemberIdentity::from_header_element(&Element::parse(&xml).unwrap()).unwrap();
        assert_eq!(parsed, member);
        assert_eq!(parsed.member_code(), Some("1234"));
        assert_eq!(parsed.to_string(), "EE//1234/SUB");
    }

    #[test]
    fn test_object_type_parse() {
        assert_eq!("service".parse::<ObjectType>().unwrap(), ObjectType::Service);
        assert_eq!("SUBSYSTEM".parse::<ObjectType>().unwrap(), ObjectType::Subsystem);
        assert!("MEMBER".parse::<ObjectType>().is_err());
        assert_eq!(
            serde_json::to_string(&ObjectType::Subsystem).unwrap(),
            "\"SUBSYSTEM\""
        );
    }
}
