#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use wiremock::MockServer;

use gantry::auth::{AccessToken, OAuthFlow};
use gantry::config::AuthOptions;

pub fn make_token(
    access: &str,
    refresh: Option<&str>,
    expires_at: DateTime<Utc>,
) -> AccessToken {
    AccessToken {
        access_token: access.to_string(),
        token_type: "Bearer".to_string(),
        expires_at,
        refresh_token: refresh.map(String::from),
        scopes: None,
    }
}

pub fn valid_token(access: &str) -> AccessToken {
    make_token(access, Some("refresh"), Utc::now() + Duration::hours(2))
}

pub fn expired_token(access: &str, refresh: Option<&str>) -> AccessToken {
    make_token(access, refresh, Utc::now() - Duration::minutes(30))
}

/// Options wired to a mock server's token endpoint.
pub fn mock_options(server: &MockServer) -> AuthOptions {
    AuthOptions::new("test-client", "https://localhost:8080/callback")
        .with_scopes(["read", "write"])
        .with_token_endpoint(format!("{}/oauth/token", server.uri()))
        .with_authorization_endpoint(format!("{}/oauth/authorize", server.uri()))
        .with_base_url(server.uri())
}

pub fn mock_flow(server: &MockServer) -> OAuthFlow {
    OAuthFlow::new(mock_options(server)).expect("valid mock options")
}
