//! Mock API tests for the HTTP transport.
//!
//! These tests use wiremock to simulate the API server and exercise the full
//! request, refresh and replay cycle over real HTTP.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use retoken_core::{
    AccessToken, AuthClient, BaseUrl, CredentialPair, CredentialStore, Credentials, Error,
    MemoryCredentialStore, RefreshFailedError, RefreshToken, Request, TransportError,
};
use retoken_http::HttpConfig;

/// Helper to create a base URL from a mock server.
fn mock_base_url(server: &MockServer) -> BaseUrl {
    BaseUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

fn store_with(access: &str, refresh: &str) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_pair(CredentialPair::new(
        Some(AccessToken::new(access)),
        Some(RefreshToken::new(refresh)),
    )))
}

fn client_for(base: BaseUrl, store: Arc<MemoryCredentialStore>) -> (AuthClient, Arc<AtomicUsize>) {
    let ends = Arc::new(AtomicUsize::new(0));
    let counter = ends.clone();
    let client = retoken_http::client_builder(&HttpConfig::new(base), store)
        .unwrap()
        .on_session_end(move |_: &RefreshFailedError| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build();
    (client, ends)
}

async fn mount_projects(server: &MockServer, valid_token: &str) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/projects/\d+$"))
        .and(header("authorization", format!("Bearer {valid_token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/projects/\d+$"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "ExpiredToken",
            "message": "jwt expired"
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Request Tests
// ============================================================================

#[tokio::test]
async fn test_request_carries_token_body_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bids"))
        .and(header("authorization", "Bearer access-token"))
        .and(header("x-client", "web"))
        .and(body_json(json!({"project": 7, "amount": 120})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "bid-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(mock_base_url(&server), store_with("access-token", "refresh"));

    let created: serde_json::Value = client
        .send_json(
            Request::post("/bids")
                .with_header("X-Client", "web")
                .with_json(json!({"project": 7, "amount": 120})),
        )
        .await
        .unwrap();

    assert_eq!(created["id"], "bid-1");
}

#[tokio::test]
async fn test_query_string_is_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(wiremock::matchers::query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (client, _) = client_for(mock_base_url(&server), store_with("a", "r"));
    let response = client.send(Request::get("/projects?page=2")).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_non_json_error_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("Internal Server Error")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(mock_base_url(&server), store_with("a", "r"));
    let err = client.send(Request::get("/projects")).await.unwrap_err();

    assert!(matches!(err, Error::Protocol(ref e) if e.status == 500));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let (client, _) = client_for(mock_base_url(&server), store_with("a", "r"));
    let err = client
        .send(Request::get("/slow").with_timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(TransportError::Timeout { duration_ms: 100 })
    ));
}

#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let base = BaseUrl::new(format!("http://127.0.0.1:{port}")).unwrap();

    let (client, _) = client_for(base, store_with("a", "r"));
    let err = client.send(Request::get("/projects")).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(TransportError::Connection { .. })
    ));
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "email": "alice@example.com",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "test-access-token",
            "refreshToken": "test-refresh-token"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let (client, _) = client_for(mock_base_url(&server), store.clone());
    client
        .login(Credentials::new("alice@example.com", "secret123"))
        .await
        .unwrap();

    let pair = store.get();
    assert_eq!(pair.access_token().unwrap().as_str(), "test-access-token");
    assert_eq!(pair.refresh_token().unwrap().as_str(), "test-refresh-token");
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "InvalidCredentials",
            "message": "Invalid email or password"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let (client, ends) = client_for(mock_base_url(&server), store.clone());
    let err = client
        .login(Credentials::new("bad@example.com", "wrong"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("401"));
    assert!(store.get().is_empty());
    assert_eq!(ends.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Refresh Tests
// ============================================================================

#[tokio::test]
async fn test_concurrent_expiry_refreshes_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refreshToken": "old-refresh"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "accessToken": "new-access",
                    "refreshToken": "new-refresh"
                }))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_projects(&server, "new-access").await;

    let store = store_with("old-access", "old-refresh");
    let (client, ends) = client_for(mock_base_url(&server), store.clone());

    let results = join_all((0..6).map(|i| client.send(Request::get(format!("/projects/{i}"))))).await;
    for result in results {
        assert_eq!(result.unwrap().status(), 200);
    }

    let pair = store.get();
    assert_eq!(pair.access_token().unwrap().as_str(), "new-access");
    assert_eq!(pair.refresh_token().unwrap().as_str(), "new-refresh");
    assert_eq!(ends.load(Ordering::SeqCst), 0);

    server.verify().await;
}

#[tokio::test]
async fn test_refresh_rejected_ends_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "InvalidToken"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_projects(&server, "never-issued").await;

    let store = store_with("old-access", "revoked-refresh");
    let (client, ends) = client_for(mock_base_url(&server), store.clone());

    let results = join_all((0..4).map(|i| client.send(Request::get(format!("/projects/{i}"))))).await;
    let failures: Vec<_> = results
        .iter()
        .map(|r| r.as_ref().unwrap_err().refresh_failure().cloned().unwrap())
        .collect();

    for failure in &failures {
        assert!(Arc::ptr_eq(failure, &failures[0]));
    }
    assert!(matches!(
        failures[0].as_ref(),
        RefreshFailedError::Rejected(e) if e.error.as_deref() == Some("InvalidToken")
    ));
    assert_eq!(ends.load(Ordering::SeqCst), 1);
    assert!(store.get().is_empty());

    server.verify().await;
}

#[tokio::test]
async fn test_refresh_endpoint_rejection_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, ends) = client_for(mock_base_url(&server), store_with("a", "r"));
    let err = client
        .send(Request::post("/auth/refresh").with_json(json!({"refreshToken": "r"})))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol(ref e) if e.status == 401));
    assert_eq!(ends.load(Ordering::SeqCst), 0);

    server.verify().await;
}

#[tokio::test]
async fn test_custom_refresh_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "rotated",
            "refresh_token": "rotated-refresh"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_projects(&server, "rotated").await;

    let mut config = HttpConfig::new(mock_base_url(&server));
    config.client.refresh = retoken_core::EndpointConfig::new(retoken_core::Method::Put, "/api/session");

    let store = store_with("stale", "refresh");
    let client = retoken_http::client_builder(&config, store.clone())
        .unwrap()
        .build();

    let response = client.send(Request::get("/projects/1")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(store.get().access_token().unwrap().as_str(), "rotated");

    server.verify().await;
}
