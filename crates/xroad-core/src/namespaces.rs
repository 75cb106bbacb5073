//! Namespace URIs and preferred prefixes used on the X-Road wire.

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Preferred prefix for [`SOAP_ENV`].
pub const SOAP_ENV_PREFIX: &str = "soapenv";

/// X-Road message header namespace.
pub const XROAD: &str = "http://x-road.eu/xsd/xroad.xsd";

/// Preferred prefix for [`XROAD`].
pub const XROAD_PREFIX: &str = "xro";

/// X-Road identifier namespace.
pub const IDENTIFIERS: &str = "http://x-road.eu/xsd/identifiers";

/// Preferred prefix for [`IDENTIFIERS`].
pub const IDENTIFIERS_PREFIX: &str = "iden";

/// WS-Addressing namespace. SOAP stacks inject it; Security Servers reject it.
pub const WS_ADDRESSING: &str = "http://www.w3.org/2005/08/addressing";

/// Preferred prefix for [`WS_ADDRESSING`].
pub const WS_ADDRESSING_PREFIX: &str = "wsa";

/// WSDL 1.1 namespace.
pub const WSDL: &str = "http://schemas.xmlsoap.org/wsdl/";

/// WSDL SOAP 1.1 binding namespace.
pub const WSDL_SOAP: &str = "http://schemas.xmlsoap.org/wsdl/soap/";

/// XML Schema namespace.
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema";

/// The reserved `xml` prefix namespace.
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
