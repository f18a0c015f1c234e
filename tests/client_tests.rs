//! Authenticated client tests: Bearer injection and the
//! refresh-and-retry-once protocol on 401 responses.

mod auth_support;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gantry::auth::{MemoryTokenStorage, TokenManager, TokenStorage};
use gantry::client::AuthedClient;
use gantry::error::GantryError;
use gantry::util::RetryPolicy;

use auth_support::{expired_token, mock_flow, valid_token};

fn client_with_token(
    server: &MockServer,
    token: gantry::auth::AccessToken,
) -> (Arc<TokenManager>, AuthedClient) {
    let storage = Arc::new(MemoryTokenStorage::new());
    let flow = mock_flow(server);
    let manager = Arc::new(TokenManager::new(storage.clone(), flow));
    storage
        .save(manager.storage_key(), &token)
        .expect("seed token");
    let client = AuthedClient::new(manager.clone(), server.uri());
    (manager, client)
}

#[tokio::test]
async fn get_sends_bearer_header_from_manager() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1.0/me"))
        .and(header("Authorization", "Bearer api-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 42,
            "login": "pm@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_manager, client) = client_with_token(&server, valid_token("api-access"));

    let me: serde_json::Value = client.get_json("/rest/v1.0/me").await.expect("get");
    assert_eq!(me["login"], "pm@example.com");
    server.verify().await;
}

#[tokio::test]
async fn unauthorized_response_triggers_one_refresh_and_retry() {
    let server = MockServer::start().await;

    // Stale bearer: rejected once.
    Mock::given(method("GET"))
        .and(path("/rest/v1.0/me"))
        .and(header("Authorization", "Bearer stale-access"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    // Refresh grant issues a new token.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-access",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "next-refresh"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The retried request succeeds with the fresh bearer.
    Mock::given(method("GET"))
        .and(path("/rest/v1.0/me"))
        .and(header("Authorization", "Bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Token looks valid locally but the server has revoked it.
    let (_manager, client) = client_with_token(&server, valid_token("stale-access"));

    let me: serde_json::Value = client.get_json("/rest/v1.0/me").await.expect("get");
    assert_eq!(me["id"], 42);
    server.verify().await;
}

#[tokio::test]
async fn second_unauthorized_response_is_returned_to_caller() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1.0/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "still-rejected",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_manager, client) = client_with_token(&server, valid_token("stale-access"));

    let result: Result<serde_json::Value, _> = client.get_json("/rest/v1.0/me").await;
    assert!(matches!(result, Err(GantryError::Authentication(_))));
    server.verify().await;
}

#[tokio::test]
async fn refresh_failure_during_retry_surfaces_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1.0/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (manager, client) = client_with_token(&server, valid_token("stale-access"));

    let result: Result<serde_json::Value, _> = client.get_json("/rest/v1.0/me").await;
    assert!(matches!(result, Err(GantryError::Authentication(_))));

    // Failed refresh cleared the stored token.
    let again = manager.get_access_token().await;
    assert!(again.is_err());
    server.verify().await;
}

#[tokio::test]
async fn expired_token_is_refreshed_before_the_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "pre-refreshed",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "next"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1.0/companies"))
        .and(header("Authorization", "Bearer pre-refreshed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (_manager, client) =
        client_with_token(&server, expired_token("old", Some("refresh-1")));

    let companies: serde_json::Value =
        client.get_json("/rest/v1.0/companies").await.expect("get");
    assert_eq!(companies, serde_json::json!([]));
    server.verify().await;
}

#[tokio::test]
async fn get_with_retry_policy_recovers_from_transient_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1.0/projects"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1.0/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let (_manager, client) = client_with_token(&server, valid_token("api-access"));
    let client = client.with_retry(RetryPolicy {
        initial_backoff: std::time::Duration::from_millis(1),
        ..RetryPolicy::default()
    });

    let projects: serde_json::Value =
        client.get_json("/rest/v1.0/projects").await.expect("get");
    assert_eq!(projects[0]["id"], 1);
    server.verify().await;
}

#[tokio::test]
async fn post_sends_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1.0/projects"))
        .and(header("Authorization", "Bearer api-access"))
        .and(body_string_contains("\"name\":\"Site A\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": 7,
            "name": "Site A"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_manager, client) = client_with_token(&server, valid_token("api-access"));

    let created: serde_json::Value = client
        .post_json("/rest/v1.0/projects", &serde_json::json!({"name": "Site A"}))
        .await
        .expect("post");
    assert_eq!(created["id"], 7);
    server.verify().await;
}

#[tokio::test]
async fn delete_maps_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1.0/projects/7"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let (_manager, client) = client_with_token(&server, valid_token("api-access"));

    let result = client.delete("/rest/v1.0/projects/7").await;
    match result {
        Err(GantryError::Api { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected Api error, got {other:?}"),
    }
    server.verify().await;
}
