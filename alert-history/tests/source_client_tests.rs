//! Capability probe and alert query against a simulated source

mod common;

use alert_history::capability::{CapabilityProbe, KapacitorProbe};
use alert_history::client::{ClientError, SourceClient};
use alert_history::config::{HttpConfig, QueryConfig};
use alert_history::query::{AlertQueryClient, InfluxAlertQuery, QueryOutcome};
use common::*;
use mockito::Matcher;
use serde_json::json;

fn client(server: &mockito::ServerGuard) -> SourceClient {
    SourceClient::new(&server.url(), &HttpConfig::default()).unwrap()
}

// ============== Capability Probe Tests ==============

#[tokio::test]
async fn test_probe_with_kapacitor() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", KAPACITORS_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"kapacitors": [{"id": "1", "name": "kapa", "url": "http://localhost:9092", "active": true}]}"#)
        .create_async()
        .await;

    let probe = KapacitorProbe::new(client(&server));
    assert!(probe.probe(&test_source()).await.unwrap());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_probe_without_kapacitor() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", KAPACITORS_PATH)
        .with_status(200)
        .with_body(r#"{"kapacitors": []}"#)
        .create_async()
        .await;

    let probe = KapacitorProbe::new(client(&server));
    assert!(!probe.probe(&test_source()).await.unwrap());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_probe_lists_kapacitors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", KAPACITORS_PATH)
        .with_status(200)
        .with_body(r#"{"kapacitors": [{"name": "a"}, {"name": "b", "url": "http://b:9092"}]}"#)
        .create_async()
        .await;

    let probe = KapacitorProbe::new(client(&server));
    let kapacitors = probe.list(&test_source()).await.unwrap();
    assert_eq!(kapacitors.len(), 2);
    assert_eq!(kapacitors[1].url.as_deref(), Some("http://b:9092"));
}

#[tokio::test]
async fn test_probe_server_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", KAPACITORS_PATH)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let probe = KapacitorProbe::new(client(&server));
    match probe.probe(&test_source()).await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_probe_unauthorized() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", KAPACITORS_PATH)
        .with_status(401)
        .create_async()
        .await;

    let probe = KapacitorProbe::new(client(&server));
    assert!(matches!(
        probe.probe(&test_source()).await,
        Err(ClientError::AuthFailed)
    ));
}

#[tokio::test]
async fn test_probe_sends_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", KAPACITORS_PATH)
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_body(r#"{"kapacitors": []}"#)
        .create_async()
        .await;

    let probe = KapacitorProbe::new(client(&server).with_token("secret"));
    assert!(!probe.probe(&test_source()).await.unwrap());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_probe_connection_refused() {
    let client = SourceClient::new("http://127.0.0.1:1", &HttpConfig::default()).unwrap();
    let probe = KapacitorProbe::new(client);

    assert!(matches!(
        probe.probe(&test_source()).await,
        Err(ClientError::Http(_))
    ));
}

#[tokio::test]
async fn test_probe_times_out_on_silent_server() {
    // Accepted by the kernel backlog but never answered
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let http = HttpConfig {
        timeout_secs: 1,
        ..Default::default()
    };
    let client = SourceClient::new(&format!("http://{}", listener.local_addr().unwrap()), &http).unwrap();
    let probe = KapacitorProbe::new(client);

    match probe.probe(&test_source()).await {
        Err(e) => assert!(e.is_timeout(), "expected timeout, got {:?}", e),
        Ok(answer) => panic!("expected timeout, got {}", answer),
    }
    assert!(!ClientError::AuthFailed.is_timeout());
}

// ============== Alert Query Tests ==============

#[tokio::test]
async fn test_query_returns_series() {
    let mut server = mockito::Server::new_async().await;
    let series = alert_series(3);
    let mock = server
        .mock("POST", PROXY_PATH)
        .match_body(Matcher::PartialJson(json!({"db": "chronograf"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(query_body(&series).to_string())
        .create_async()
        .await;

    let query = InfluxAlertQuery::new(client(&server), QueryConfig::default());
    let outcome = query.fetch(PROXY_PATH, &window("2024-03-01T11:00:00Z")).await.unwrap();

    assert_eq!(outcome, QueryOutcome::Series(series));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_query_sends_window_bounds() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PROXY_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("time >= '2024-03-01T11:00:00Z'".to_string()),
            Matcher::Regex("time <= '2024-03-01T12:00:00Z'".to_string()),
            Matcher::Regex("\"rp\":\"autogen\"".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"results": [{"statement_id": 0}]}"#)
        .create_async()
        .await;

    let config = QueryConfig {
        retention_policy: Some("autogen".to_string()),
        ..Default::default()
    };
    let query = InfluxAlertQuery::new(client(&server), config);
    query.fetch(PROXY_PATH, &window("2024-03-01T11:00:00Z")).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_query_without_series_is_empty() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PROXY_PATH)
        .with_status(200)
        .with_body(r#"{"results": [{"statement_id": 0}]}"#)
        .create_async()
        .await;

    let query = InfluxAlertQuery::new(client(&server), QueryConfig::default());
    let outcome = query.fetch(PROXY_PATH, &window("2024-03-01T11:00:00Z")).await.unwrap();
    assert_eq!(outcome, QueryOutcome::Empty);
}

#[tokio::test]
async fn test_query_with_empty_series_list_is_empty() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PROXY_PATH)
        .with_status(200)
        .with_body(r#"{"results": [{"statement_id": 0, "series": []}]}"#)
        .create_async()
        .await;

    let query = InfluxAlertQuery::new(client(&server), QueryConfig::default());
    let outcome = query.fetch(PROXY_PATH, &window("2024-03-01T11:00:00Z")).await.unwrap();
    assert_eq!(outcome, QueryOutcome::Empty);
}

#[tokio::test]
async fn test_query_statement_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PROXY_PATH)
        .with_status(200)
        .with_body(r#"{"results": [{"statement_id": 0, "error": "database not found: chronograf"}]}"#)
        .create_async()
        .await;

    let query = InfluxAlertQuery::new(client(&server), QueryConfig::default());
    match query.fetch(PROXY_PATH, &window("2024-03-01T11:00:00Z")).await {
        Err(ClientError::Statement(message)) => assert!(message.contains("database not found")),
        other => panic!("expected statement error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_query_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PROXY_PATH)
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let query = InfluxAlertQuery::new(client(&server), QueryConfig::default());
    assert!(matches!(
        query.fetch(PROXY_PATH, &window("2024-03-01T11:00:00Z")).await,
        Err(ClientError::Serialization(_))
    ));
}
