//! SOAP client against the mock Security Server.

use std::time::Duration;

use serde_json::{json, Map, Value};
use xroad_client::{connect, ClientConfig, ClientError, SoapClient, XRoadClient};
use xroad_core::xml::Element;
use xroad_core::namespaces::{SOAP_ENV, XROAD};
use xroad_test::fixtures::{FAULT_RESPONSE, GET_DATA_RESPONSE, GET_DATA_WSDL, LIST_METHODS_RESPONSE};
use xroad_test::{MockResponse, MockSecurityServer};

const SERVICE: &str = "EE/GOV/5678/SUB/getData/v1";

async fn server() -> MockSecurityServer {
    let server = MockSecurityServer::start().await.unwrap();
    server.mock("GET", "/wsdl", MockResponse::xml(GET_DATA_WSDL));
    server.mock(
        "POST",
        "/",
        MockResponse::xml(GET_DATA_RESPONSE).with_header("uxp-transaction-id", "tx-77"),
    );
    server
}

fn config(server: &MockSecurityServer) -> ClientConfig {
    ClientConfig::builder()
        .security_server_url(server.url())
        .client("EE/GOV/1234/SUB")
        .service(SERVICE)
        .build()
        .unwrap()
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_request_round_trip() {
    let server = server().await;
    let client = SoapClient::connect(&config(&server)).await.unwrap();

    let reply = client
        .request(args(json!({"code": "A-1", "tag": ["x", "y"], "xroad_issue": "ISSUE-1"})))
        .await
        .unwrap();

    assert_eq!(
        reply,
        json!({
            "item": [
                {"id": 1, "amount": 10.5, "name": "first"},
                {"id": 2, "amount": 3.0, "name": "second"}
            ],
            "total": 2
        })
    );

    let wsdl_requests = server.requests_to("/wsdl");
    assert_eq!(wsdl_requests.len(), 1);
    let query = wsdl_requests[0].query.clone().unwrap();
    assert!(query.contains("serviceCode=getData"));
    assert!(query.contains("version=v1"));

    let posts = server.requests_to("/");
    assert_eq!(posts.len(), 1);
    let sent = &posts[0];
    assert!(sent.header("content-type").unwrap().starts_with("text/xml"));
    assert_eq!(sent.header("soapaction"), Some("\"getData\""));

    let envelope = Element::parse(&sent.body_text()).unwrap();
    let header = envelope.child(SOAP_ENV, "Header").unwrap();
    assert_eq!(header.child(XROAD, "id").unwrap().text().len(), 32);
    assert_eq!(header.child(XROAD, "userId").unwrap().text(), "SUB");
    assert_eq!(header.child(XROAD, "issue").unwrap().text(), "ISSUE-1");

    let body = envelope.child(SOAP_ENV, "Body").unwrap();
    let request = body.child("http://example.ee/producer", "getData").unwrap();
    let names: Vec<_> = request.elements().map(Element::local_name).collect();
    assert_eq!(names, ["code", "tag", "tag"]);
    assert!(request.child_by_local("xroad_issue").is_none());

    assert_eq!(client.history().transaction_id(), "tx-77");
}

#[tokio::test]
async fn test_overrides_and_setters_persist() {
    let server = server().await;
    let client = connect(&config(&server)).await.unwrap();

    client
        .request(args(json!({"code": "a", "xroad_issue": "ISSUE-7", "xroad_purposeID": ["P1", "P2"]})))
        .await
        .unwrap();
    assert_eq!(client.issue().as_deref(), Some("ISSUE-7"));
    assert_eq!(client.purpose_ids(), ["P1", "P2"]);

    client.set_id("fixed-id");
    client.set_user_id("EE30101010007");
    client.request(args(json!({"code": "b"}))).await.unwrap();

    let posts = server.requests_to("/");
    let envelope = Element::parse(&posts[1].body_text()).unwrap();
    let header = envelope.child(SOAP_ENV, "Header").unwrap();
    assert_eq!(header.child(XROAD, "id").unwrap().text(), "fixed-id");
    assert_eq!(header.child(XROAD, "userId").unwrap().text(), "EE30101010007");
    assert_eq!(header.child(XROAD, "issue").unwrap().text(), "ISSUE-7");
}

#[tokio::test]
async fn test_fresh_id_per_call() {
    let server = server().await;
    let client = SoapClient::connect(&config(&server)).await.unwrap();

    client.request(Map::new()).await.unwrap();
    client.request(Map::new()).await.unwrap();
    assert_eq!(client.id(), None);

    let ids: Vec<String> = server
        .requests_to("/")
        .iter()
        .map(|r| {
            let envelope = Element::parse(&r.body_text()).unwrap();
            envelope
                .child(SOAP_ENV, "Header")
                .and_then(|h| h.child(XROAD, "id"))
                .map(Element::text)
                .unwrap()
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_remote_fault() {
    let server = server().await;
    server.mock(
        "POST",
        "/",
        MockResponse::status(500)
            .with_header("content-type", "text/xml")
            .with_body(FAULT_RESPONSE),
    );
    let client = SoapClient::connect(&config(&server)).await.unwrap();

    let err = client.request(args(json!({"code": "a"}))).await.unwrap_err();
    match err {
        ClientError::RemoteFault { code, message, detail } => {
            assert_eq!(code, "Server.ServerProxy.ServiceFailed");
            assert_eq!(message, "Service returned an error");
            assert!(detail.unwrap().contains("8f1c2e"));
        }
        other => panic!("expected remote fault, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_without_envelope() {
    let server = server().await;
    server.mock("POST", "/", MockResponse::status(502).with_body("bad gateway"));
    let client = SoapClient::connect(&config(&server)).await.unwrap();

    let err = client.request(Map::new()).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport { status: Some(502), .. }));
}

#[tokio::test]
async fn test_wsdl_fetch_failure() {
    let server = MockSecurityServer::start().await.unwrap();
    server.mock("GET", "/wsdl", MockResponse::status(503));

    let err = SoapClient::connect(&config(&server)).await.unwrap_err();
    assert!(matches!(err, ClientError::Fetch { status: Some(503), .. }));
}

#[tokio::test]
async fn test_unknown_operation() {
    let server = server().await;
    let mut config = config(&server);
    config.client.service = "EE/GOV/5678/SUB/missing".to_string();

    let err = SoapClient::connect(&config).await.unwrap_err();
    assert_eq!(err.category(), "validation");
}

#[tokio::test]
async fn test_describe() {
    let server = server().await;
    let client = SoapClient::connect(&config(&server)).await.unwrap();

    let input = client.describe_input().unwrap();
    assert_eq!(input["code"]["type"], json!("string"));
    assert_eq!(input["tag"]["maxOccurs"], json!("unbounded"));

    let skeleton = client.input_skeleton().unwrap();
    assert_eq!(skeleton["code"], json!(""));
    assert_eq!(skeleton["filter"]["active"], json!(false));

    let output = client.describe_output().unwrap();
    assert!(output.get("total").is_some());
}

#[tokio::test]
async fn test_patch_wsdl() {
    let server = server().await;
    let mut config = config(&server);
    config.client.patch_wsdl = true;

    let client = SoapClient::connect(&config).await.unwrap();
    assert_eq!(client.document().service_names(), ["getData"]);
    assert!(client.document().operation("broken").is_err());
}

#[tokio::test]
async fn test_list_methods() {
    let server = server().await;
    server.mock("POST", "/", MockResponse::xml(LIST_METHODS_RESPONSE));
    let client = SoapClient::connect(&config(&server)).await.unwrap();

    let services = client.list_methods().await.unwrap();
    let codes: Vec<_> = services.iter().filter_map(|s| s.service_code()).collect();
    assert_eq!(codes, ["getData", "getTree"]);
    assert_eq!(services[0].service_version(), Some("v1"));

    let sent = Element::parse(&server.requests_to("/")[0].body_text()).unwrap();
    let body = sent.child(SOAP_ENV, "Body").unwrap();
    assert!(body.child(XROAD, "listMethods").is_some());
    let service = sent
        .child(SOAP_ENV, "Header")
        .and_then(|h| h.child(XROAD, "service"))
        .unwrap();
    assert!(service.to_xml().contains("listMethods"));
}

#[tokio::test]
async fn test_sqlite_cache_shared_between_clients() {
    let server = server().await;
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::builder()
        .security_server_url(server.url())
        .client("EE/GOV/1234/SUB")
        .service(SERVICE)
        .sqlite_cache(dir.path().join("wsdl.db"), Duration::from_secs(60))
        .build()
        .unwrap();

    SoapClient::connect(&config).await.unwrap();
    SoapClient::connect(&config).await.unwrap();

    assert_eq!(server.requests_to("/wsdl").len(), 1);
}

#[tokio::test]
async fn test_invalid_configuration() {
    let mut config = ClientConfig::default();
    config.security_server.url = "http://127.0.0.1:9".to_string();
    config.client.service = SERVICE.to_string();

    let err = connect(&config).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation { field: Some(ref f), .. } if f == "client"));

    config.client.client = "EE/GOV/1234/SUB".to_string();
    config.cache.backend = xroad_client::CacheKind::Sqlite;
    let err = connect(&config).await.unwrap_err();
    assert!(matches!(err, ClientError::Configuration { .. }));
}
