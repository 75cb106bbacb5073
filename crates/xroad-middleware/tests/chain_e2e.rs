//! Request/response round trip through the default interceptor chain.

use std::sync::Arc;

use http::{HeaderMap, HeaderValue};
use xroad_core::namespaces::{SOAP_ENV, WS_ADDRESSING, XROAD};
use xroad_core::xml::Element;
use xroad_core::{HeaderState, MemberIdentity, ObjectType};
use xroad_middleware::stages::TRANSACTION_ID_HEADER;
use xroad_middleware::{BindingOptions, InterceptorChain, TransactionHistory, XRoadHeaderInterceptor};
use xroad_test::fixtures::GET_DATA_RESPONSE;

fn default_chain(history: Arc<TransactionHistory>) -> InterceptorChain {
    let client = MemberIdentity::parse(ObjectType::Subsystem, "EE/GOV/1234/SUB").unwrap();
    let mut chain = InterceptorChain::new().with(XRoadHeaderInterceptor::new(client, "https://ss.example"));
    chain.push(history);
    chain
}

#[test]
fn test_request_and_response() {
    let history = Arc::new(TransactionHistory::new());
    let chain = default_chain(history.clone());
    assert_eq!(chain.names(), ["xroad_header", "transaction_history"]);

    let client = MemberIdentity::parse(ObjectType::Subsystem, "EE/GOV/1234/SUB").unwrap();
    let service = MemberIdentity::parse(ObjectType::Service, "EE/GOV/5678/SUB/getData/v1").unwrap();
    let mut header = HeaderState::new(client, service).to_soap_header();
    header.push(Element::qualified(WS_ADDRESSING, "wsa", "To").with_text("http://internal.host"));

    let mut request = Element::qualified(SOAP_ENV, "soapenv", "Envelope")
        .with_child(header)
        .with_child(Element::qualified(SOAP_ENV, "soapenv", "Body"));
    let mut binding = BindingOptions::with_address("http://internal.host:8080/cgi-bin/consumer_proxy");
    chain.egress(&mut request, &mut HeaderMap::new(), &mut binding);

    assert_eq!(binding.address.as_deref(), Some("https://ss.example"));
    let header = request.child(SOAP_ENV, "Header").unwrap();
    assert!(!header.child(XROAD, "id").unwrap().text().is_empty());
    assert!(header.child(WS_ADDRESSING, "To").is_none());

    let mut response = Element::parse(GET_DATA_RESPONSE).unwrap();
    let mut http_headers = HeaderMap::new();
    http_headers.insert(TRANSACTION_ID_HEADER, HeaderValue::from_static("tx-42"));
    chain.ingress(&mut response, &http_headers);

    let header = response.child(SOAP_ENV, "Header").unwrap();
    assert!(header.child(XROAD, "requestHash").is_none());
    assert!(header.child(XROAD, "issue").is_none());
    assert!(header.child(XROAD, "client").is_some());
    assert_eq!(history.transaction_id(), "tx-42");
}
