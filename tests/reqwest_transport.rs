//! Wire-level tests for the reqwest transport against a local mock server

use serde_json::json;
use sl_queries::transport::{HttpRequest, Method, ReqwestTransport, Transport, TransportError};
use sl_queries::{Credentials, Orchestrator, QueryDefinition, QueryInvocation, ServiceConfig, Stage};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base: &str) -> ServiceConfig {
    ServiceConfig::new(
        format!("{}/b1s/v1", base),
        Credentials::new("manager", "secret", "SBODemoUS"),
    )
    .with_timeout_secs(5)
}

#[tokio::test]
async fn test_transport_returns_non_success_as_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b1s/v1/Missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(&config(&server.uri())).unwrap();
    let response = transport
        .send(HttpRequest::new(
            Method::Get,
            format!("{}/b1s/v1/Missing", server.uri()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 404);
    assert_eq!(response.text(), "not here");
}

#[tokio::test]
async fn test_transport_keeps_response_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/b1s/v1/Login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "B1SESSION=abc; HttpOnly")
                .set_body_json(json!({"SessionId": "abc"})),
        )
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_client(reqwest::Client::new());
    let response = transport
        .send(HttpRequest::new(
            Method::Post,
            format!("{}/b1s/v1/Login", server.uri()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.header("set-cookie"), Some("B1SESSION=abc; HttpOnly"));
    assert_eq!(response.header("Content-Type"), Some("application/json"));
}

#[tokio::test]
async fn test_parameter_separators_survive_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/b1s/v1/SQLQueries('Q')/List"))
        .and(query_param("name", "'R&D'"))
        .and(query_param("code", "'A#1'"))
        .and(query_param("z", "'last'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let invocation = QueryInvocation::new()
        .with_param("name", "'R&D'")
        .with_param("code", "'A#1'")
        .with_param("z", "'last'");
    let url = format!(
        "{}/b1s/v1/SQLQueries('Q')/List?{}",
        server.uri(),
        invocation.query_string()
    );

    let transport = ReqwestTransport::with_client(reqwest::Client::new());
    let response = transport
        .send(HttpRequest::new(Method::Get, url))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 200);
}

#[tokio::test]
async fn test_transport_connection_failure() {
    let transport = ReqwestTransport::new(&config("http://127.0.0.1:1")).unwrap();
    let result = transport
        .send(HttpRequest::new(Method::Get, "http://127.0.0.1:1/b1s/v1/Login"))
        .await;

    assert!(matches!(
        result,
        Err(TransportError::Connect(_)) | Err(TransportError::Request(_))
    ));
}

#[tokio::test]
async fn test_full_run_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/b1s/v1/Login"))
        .and(body_json(json!({
            "UserName": "manager",
            "Password": "secret",
            "CompanyDB": "SBODemoUS"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "SessionId": "wire-token",
            "Version": "1000190",
            "SessionTimeout": 30
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b1s/v1/SQLQueries"))
        .and(header("Cookie", "B1SESSION=wire-token"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({
            "SqlCode": "GetCardCodeData",
            "SqlName": "whatever",
            "SqlText": "select cardcode from ocrd where cardcode = :cardcode"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b1s/v1/SQLQueries('GetCardCodeData')/List"))
        .and(query_param("cardcode", "'C20000'"))
        .and(header("Cookie", "B1SESSION=wire-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"CardCode": "C20000", "Balance": 100.5}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/b1s/v1/SQLQueries('GetCardCodeData')"))
        .and(header("Cookie", "B1SESSION=wire-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/b1s/v1/Logout"))
        .and(header("Cookie", "B1SESSION=wire-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server.uri());
    let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
    let orchestrator = Orchestrator::new(config, transport);

    let report = orchestrator
        .run(
            &QueryDefinition::new(
                "GetCardCodeData",
                "whatever",
                "select cardcode from ocrd where cardcode = :cardcode",
            ),
            &QueryInvocation::new().with_param("cardcode", "'C20000'"),
        )
        .await;

    assert!(report.succeeded(), "stages: {:?}", report.stages);
    let rendered: Vec<String> = report.entries.iter().map(|e| e.to_string()).collect();
    assert_eq!(rendered, vec!["/CardCode: C20000", "/Balance: 100.5"]);
}

#[tokio::test]
async fn test_rejected_login_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/b1s/v1/Login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": -304, "message": {"lang": "en-us", "value": "Fail to get DB Credentials"}}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/b1s/v1/Logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let config = config(&server.uri());
    let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
    let report = Orchestrator::new(config, transport)
        .run(
            &QueryDefinition::new("Q", "q", "select 1"),
            &QueryInvocation::new(),
        )
        .await;

    assert!(!report.succeeded());
    assert!(report.attempted(Stage::Login));
    assert!(!report.attempted(Stage::Logout));
}
