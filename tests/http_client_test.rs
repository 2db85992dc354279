//! Integration tests for HttpApiClient using wiremock

use serde_json::json;
use tokio::sync::watch;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsdesk::app::NetworkError;
use newsdesk::config::ApiConfig;
use newsdesk::domain::Settings;
use newsdesk::fetcher::{ApiClient, HttpApiClient};

fn config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: format!("{}/v2", server.uri()),
        api_key: "secret".into(),
        timeout_secs: 5,
        ..ApiConfig::default()
    }
}

fn online() -> (watch::Sender<Settings>, watch::Receiver<Settings>) {
    watch::channel(Settings::default())
}

/// Test that the api key and caller params reach the server
#[tokio::test]
async fn test_get_injects_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .and(query_param("apiKey", "secret"))
        .and(query_param("category", "technology"))
        .and(query_param("pageSize", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "articles": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_tx, rx) = online();
    let client = HttpApiClient::new(&config(&server), rx).unwrap();
    let body = client
        .get(
            "/top-headlines",
            &[
                ("category", "technology".to_string()),
                ("pageSize", "20".to_string()),
            ],
        )
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
}

/// Test that offline mode blocks requests before the network
#[tokio::test]
async fn test_offline_mode_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "articles": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let (tx, rx) = online();
    let client = HttpApiClient::new(&config(&server), rx).unwrap();

    tx.send_replace(Settings {
        offline_reading: true,
        ..Settings::default()
    });
    let err = client.get("/everything", &[]).await.unwrap_err();
    assert_eq!(err, NetworkError::OfflineModeActive);
}

/// Test that toggling offline off again re-enables requests
#[tokio::test]
async fn test_offline_mode_follows_settings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "articles": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let (tx, rx) = watch::channel(Settings {
        offline_reading: true,
        ..Settings::default()
    });
    let client = HttpApiClient::new(&config(&server), rx).unwrap();
    assert!(client.get("/everything", &[]).await.is_err());

    tx.send_modify(|s| s.offline_reading = false);
    assert!(client.get("/everything", &[]).await.is_ok());
}

/// Test 4xx maps to a client status error
#[tokio::test]
async fn test_client_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "code": "apiKeyInvalid"
        })))
        .mount(&server)
        .await;

    let (_tx, rx) = online();
    let client = HttpApiClient::new(&config(&server), rx).unwrap();
    let err = client.get("/top-headlines", &[]).await.unwrap_err();

    assert_eq!(err, NetworkError::ClientStatus(401));
}

/// Test 5xx maps to a server status error
#[tokio::test]
async fn test_server_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (_tx, rx) = online();
    let client = HttpApiClient::new(&config(&server), rx).unwrap();
    let err = client.get("/top-headlines", &[]).await.unwrap_err();

    assert_eq!(err, NetworkError::ServerStatus(503));
}

/// Test that a non-JSON body is a parse error
#[tokio::test]
async fn test_invalid_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let (_tx, rx) = online();
    let client = HttpApiClient::new(&config(&server), rx).unwrap();
    let err = client.get("/top-headlines", &[]).await.unwrap_err();

    assert!(matches!(err, NetworkError::Parse(_)));
}
