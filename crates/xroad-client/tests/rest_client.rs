//! REST client against the mock Security Server.

use serde_json::{json, Map, Value};
use xroad_client::{connect, ClientConfig, ClientError, Protocol, XRoadClient};
use xroad_test::{MockResponse, MockSecurityServer};

fn config(server: &MockSecurityServer, method: &str) -> ClientConfig {
    ClientConfig::builder()
        .security_server_url(server.url())
        .protocol(Protocol::Rest)
        .client("EE/GOV/1234/SUB")
        .service("EE/GOV/5678/SUB/getPerson/v2")
        .http_method(method)
        .build()
        .unwrap()
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_get_returns_json() {
    let server = MockSecurityServer::start().await.unwrap();
    server.mock("GET", "/restapi", MockResponse::json(&json!({"name": "Mari", "age": 41})));
    let client = connect(&config(&server, "GET")).await.unwrap();

    let reply = client
        .request(args(json!({"code": "38001010000", "xroad_issue": "ISSUE-3", "xroad_id": "rest-1"})))
        .await
        .unwrap();
    assert_eq!(reply, json!({"name": "Mari", "age": 41}));

    let sent = &server.requests_to("/restapi")[0];
    assert_eq!(sent.query.as_deref(), Some("code=38001010000"));
    assert_eq!(sent.header("x-road-client"), Some("EE/GOV/1234/SUB"));
    assert_eq!(sent.header("x-road-service"), Some("EE/GOV/5678/SUB/getPerson/v2"));
    assert_eq!(sent.header("x-road-userid"), Some("SUB"));
    assert_eq!(sent.header("x-road-issue"), Some("ISSUE-3"));
    assert_eq!(sent.header("x-road-id"), Some("rest-1"));
}

#[tokio::test]
async fn test_fresh_id_without_explicit_one() {
    let server = MockSecurityServer::start().await.unwrap();
    server.mock("GET", "/restapi", MockResponse::json(&json!({})));
    let client = connect(&config(&server, "GET")).await.unwrap();

    client.request(Map::new()).await.unwrap();
    client.request(Map::new()).await.unwrap();

    let ids: Vec<String> = server
        .requests_to("/restapi")
        .iter()
        .map(|r| r.header("x-road-id").unwrap().to_string())
        .collect();
    assert_eq!(ids[0].len(), 32);
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_non_200_status_is_wrapped() {
    let server = MockSecurityServer::start().await.unwrap();
    server.mock("POST", "/restapi", MockResponse::status(404).with_body("person not found"));
    let client = connect(&config(&server, "POST")).await.unwrap();

    let reply = client.request(args(json!({"code": "1"}))).await.unwrap();
    assert_eq!(reply, json!({"status_code": 404, "content": "person not found"}));
    assert_eq!(server.requests_to("/restapi")[0].method, http::Method::POST);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = MockSecurityServer::start().await.unwrap();
    server.mock("GET", "/restapi", MockResponse::status(200).with_body("not json"));
    let client = connect(&config(&server, "GET")).await.unwrap();

    let err = client.request(Map::new()).await.unwrap_err();
    assert!(matches!(err, ClientError::Protocol { .. }));
}

#[tokio::test]
async fn test_purpose_ids_header() {
    let server = MockSecurityServer::start().await.unwrap();
    server.mock("GET", "/restapi", MockResponse::json(&json!([])));
    let client = connect(&config(&server, "GET")).await.unwrap();

    client.set_purpose_ids(&["P1".to_string(), "P2".to_string()]);
    client.request(Map::new()).await.unwrap();

    let sent = &server.requests_to("/restapi")[0];
    assert_eq!(sent.header("x-road-purpose-ids"), Some("P1,P2"));
    assert_eq!(client.service().service_code(), Some("getPerson"));
}
