//! WSDL 1.1 document model.
//!
//! Only what the adapter needs is extracted: service names, the advertised
//! SOAP address, messages, port-type operations and the embedded schemas.
//! QName references are resolved by local name.

use std::collections::HashMap;

use xroad_core::namespaces::{WSDL, WSDL_SOAP, XSD};
use xroad_core::xml::Element;

use crate::error::{WsdlError, WsdlResult};

/// A `wsdl:part`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    /// Part name.
    pub name: String,
    /// Global element (document/literal).
    pub element: Option<String>,
    /// Type (rpc style).
    pub type_name: Option<String>,
}

/// A `wsdl:portType/wsdl:operation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Operation name (the X-Road service code).
    pub name: String,
    /// Input message name.
    pub input: Option<String>,
    /// Output message name.
    pub output: Option<String>,
    /// `soapAction` from the SOAP binding.
    pub soap_action: Option<String>,
}

/// A parsed service description.
#[derive(Debug, Clone)]
pub struct WsdlDocument {
    target_namespace: Option<String>,
    service_names: Vec<String>,
    address: Option<String>,
    messages: HashMap<String, Vec<MessagePart>>,
    operations: Vec<Operation>,
    schemas: Vec<Element>,
}

impl WsdlDocument {
    /// Parses a service description.
    pub fn parse(bytes: &[u8]) -> WsdlResult<Self> {
        let root = Element::parse_bytes(bytes)?;
        Self::from_element(&root)
    }

    /// Reads a service description from an already parsed root element.
    pub fn from_element(root: &Element) -> WsdlResult<Self> {
        if !root.is(WSDL, "definitions") {
            return Err(WsdlError::schema(format!(
                "expected wsdl:definitions, found {}",
                root.local_name()
            )));
        }

        let mut doc = Self {
            target_namespace: root.attribute("targetNamespace").map(str::to_string),
            service_names: Vec::new(),
            address: None,
            messages: HashMap::new(),
            operations: Vec::new(),
            schemas: Vec::new(),
        };
        let mut soap_actions: HashMap<String, String> = HashMap::new();

        for child in root.elements() {
            match (child.namespace(), child.local_name()) {
                (Some(WSDL), "types") => {
                    doc.schemas
                        .extend(child.elements().filter(|el| el.is(XSD, "schema")).cloned());
                }
                (Some(WSDL), "message") => {
                    let Some(name) = child.attribute("name") else {
                        continue;
                    };
                    let parts = child
                        .elements()
                        .filter(|el| el.is(WSDL, "part"))
                        .map(|part| MessagePart {
                            name: part.attribute("name").unwrap_or_default().to_string(),
                            element: part.attribute("element").map(local_part),
                            type_name: part.attribute("type").map(local_part),
                        })
                        .collect();
                    doc.messages.insert(name.to_string(), parts);
                }
                (Some(WSDL), "portType") => {
                    for op in child.elements().filter(|el| el.is(WSDL, "operation")) {
                        doc.operations.push(Operation {
                            name: op.attribute("name").unwrap_or_default().to_string(),
                            input: op
                                .child(WSDL, "input")
                                .and_then(|el| el.attribute("message"))
                                .map(local_part),
                            output: op
                                .child(WSDL, "output")
                                .and_then(|el| el.attribute("message"))
                                .map(local_part),
                            soap_action: None,
                        });
                    }
                }
                (Some(WSDL), "binding") => {
                    for op in child.elements().filter(|el| el.is(WSDL, "operation")) {
                        let action = op
                            .child(WSDL_SOAP, "operation")
                            .and_then(|el| el.attribute("soapAction"));
                        if let (Some(name), Some(action)) = (op.attribute("name"), action) {
                            soap_actions.insert(name.to_string(), action.to_string());
                        }
                    }
                }
                (Some(WSDL), "service") => {
                    if let Some(name) = child.attribute("name") {
                        doc.service_names.push(name.to_string());
                    }
                    if doc.address.is_none() {
                        doc.address = child
                            .elements()
                            .filter(|el| el.is(WSDL, "port"))
                            .find_map(|port| port.child(WSDL_SOAP, "address"))
                            .and_then(|addr| addr.attribute("location"))
                            .map(str::to_string);
                    }
                }
                _ => {}
            }
        }

        for op in &mut doc.operations {
            op.soap_action = soap_actions.remove(&op.name);
        }
        Ok(doc)
    }

    /// `targetNamespace` of the definitions.
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Names of the `wsdl:service` elements.
    pub fn service_names(&self) -> &[String] {
        &self.service_names
    }

    /// SOAP address advertised by the first port. Never used as the transport target.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Port-type operations in document order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Looks up an operation by name.
    pub fn operation(&self, name: &str) -> WsdlResult<&Operation> {
        self.operations
            .iter()
            .find(|op| op.name == name)
            .ok_or_else(|| WsdlError::schema(format!("operation not found: {name}")))
    }

    /// Parts of a message.
    pub fn message_parts(&self, message: &str) -> &[MessagePart] {
        self.messages.get(message).map(Vec::as_slice).unwrap_or_default()
    }

    /// Embedded `xsd:schema` elements.
    pub fn schemas(&self) -> &[Element] {
        &self.schemas
    }
}

/// Strips the prefix from a QName.
pub(crate) fn local_part(qname: &str) -> String {
    qname.rsplit(':').next().unwrap_or(qname).to_string()
}

#[cfg(test)]
mod tests {
    use xroad_test::fixtures::GET_DATA_WSDL;

    use super::*;

    #[test]
    fn test_parse_document() {
        let doc = WsdlDocument::parse(GET_DATA_WSDL.as_bytes()).unwrap();

        assert_eq!(doc.target_namespace(), Some("http://example.ee/producer"));
        assert_eq!(doc.service_names(), ["generatedService_42".to_string()]);
        assert_eq!(
            doc.address(),
            Some("http://internal.host:8080/cgi-bin/consumer_proxy")
        );
        assert_eq!(doc.schemas().len(), 1);
    }

    #[test]
    fn test_operations() {
        let doc = WsdlDocument::parse(GET_DATA_WSDL.as_bytes()).unwrap();
        assert_eq!(doc.operations().len(), 2);

        let op = doc.operation("getData").unwrap();
        assert_eq!(op.input.as_deref(), Some("getData"));
        assert_eq!(op.output.as_deref(), Some("getDataResponse"));
        assert_eq!(op.soap_action.as_deref(), Some("getData"));

        let parts = doc.message_parts("getData");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].element.as_deref(), Some("getData"));

        assert!(doc.operation("missing").is_err());
        assert!(doc.message_parts("missing").is_empty());
    }

    #[test]
    fn test_rejects_non_wsdl() {
        let err = WsdlDocument::parse(b"<html><body/></html>").unwrap_err();
        assert!(matches!(err, WsdlError::Schema { .. }));

        let err = WsdlDocument::parse(b"<definitions").unwrap_err();
        assert!(matches!(err, WsdlError::Xml(_)));
    }

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("tns:getData"), "getData");
        assert_eq!(local_part("getData"), "getData");
    }
}
