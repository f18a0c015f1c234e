//! Authenticated HTTP client: Bearer injection and refresh-on-401.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::{AccessToken, TokenManager};
use crate::error::{GantryError, Result};
use crate::util::RetryPolicy;

/// HTTP client for the Procore REST surface that injects
/// `Authorization: Bearer <token>` on every request and retries once with
/// a freshly refreshed token after a 401.
///
/// The generated per-endpoint request builders sit on top of this; the
/// client itself only knows about JSON in, JSON out.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use gantry::auth::{MemoryTokenStorage, OAuthFlow, TokenManager};
/// use gantry::client::AuthedClient;
/// use gantry::config::AuthOptions;
///
/// # async fn example() -> gantry::error::Result<()> {
/// let options = AuthOptions::new("client-id", "https://localhost:8080/callback");
/// let base_url = options.base_url.clone();
/// let flow = OAuthFlow::new(options)?;
/// let manager = Arc::new(TokenManager::new(Arc::new(MemoryTokenStorage::new()), flow));
/// let client = AuthedClient::new(manager, base_url);
/// let me: serde_json::Value = client.get_json("/rest/v1.0/me").await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthedClient {
    client: reqwest::Client,
    base_url: String,
    manager: Arc<TokenManager>,
    retry: Option<RetryPolicy>,
}

impl AuthedClient {
    pub fn new(manager: Arc<TokenManager>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            manager,
            retry: None,
        }
    }

    /// Apply a retry policy to idempotent GET requests.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// GET a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        match self.retry.clone() {
            Some(policy) => {
                policy
                    .execute("api_get", || self.request_json(Method::GET, path, None))
                    .await
            }
            None => self.request_json(Method::GET, path, None).await,
        }
    }

    /// POST a JSON body and parse a JSON response.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request_json(Method::POST, path, Some(body)).await
    }

    /// PATCH a JSON body and parse a JSON response.
    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request_json(Method::PATCH, path, Some(body)).await
    }

    /// DELETE a resource, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let resp = self.send_authed(Method::DELETE, path, None).await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(status_to_error(status.as_u16(), &body))
        }
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let resp = self.send_authed(method, path, body).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body));
        }
        Ok(resp.json().await?)
    }

    /// Send a request with the current token; on 401, refresh once and
    /// resend. A second 401 goes back to the caller.
    async fn send_authed(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let token = self.manager.get_access_token().await?;
        let resp = self.send_once(method.clone(), path, body.clone(), &token).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        tracing::debug!(path, "received 401, refreshing token and retrying once");
        let refreshed = self.manager.refresh().await?;
        Ok(self.send_once(method, path, body, &refreshed).await?)
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        token: &AccessToken,
    ) -> std::result::Result<reqwest::Response, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, url)
            .headers(bearer_headers(token));
        if let Some(body) = body {
            request = request.json(&body);
        }
        request.send().await
    }
}

/// Build default headers for a Bearer-token request.
pub fn bearer_headers(token: &AccessToken) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let value = format!("{} {}", token.token_type, token.access_token);
    if let Ok(val) = HeaderValue::from_str(&value) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map an HTTP error status to a crate error.
pub fn status_to_error(status: u16, body: &str) -> GantryError {
    match status {
        401 | 403 => GantryError::Authentication(body.to_string()),
        429 => GantryError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => GantryError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    // Try to parse retry-after from a JSON error body
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}
