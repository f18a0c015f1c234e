//! OAuth2 authorization-code flow with PKCE against the Procore endpoints.

use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::config::AuthOptions;

use super::error::AuthError;
use super::pkce;
use super::token::AccessToken;

/// PKCE authorization session returned by [`OAuthFlow::authorization_url`].
///
/// The caller opens `authorize_url` in a browser, then passes the callback
/// `code` together with `code_verifier` to [`OAuthFlow::exchange_code`].
/// `state` should be compared against the callback's `state` query
/// parameter before exchanging.
#[derive(Debug, Clone)]
pub struct AuthorizationSession {
    pub authorize_url: String,
    pub state: String,
    pub code_verifier: String,
}

/// OAuth 2.0 authorization-code + refresh-token client.
///
/// # Example
/// ```no_run
/// use gantry::auth::OAuthFlow;
/// use gantry::config::AuthOptions;
///
/// let options = AuthOptions::new("client-id", "https://localhost:8080/callback");
/// let flow = OAuthFlow::new(options)?;
/// let session = flow.authorization_url(None);
/// println!("open {}", session.authorize_url);
/// # Ok::<(), gantry::auth::AuthError>(())
/// ```
pub struct OAuthFlow {
    client: reqwest::Client,
    options: AuthOptions,
}

impl OAuthFlow {
    /// Build a flow from validated options. Configuration problems are
    /// fatal here rather than a runtime error path.
    pub fn new(options: AuthOptions) -> Result<Self, AuthError> {
        options
            .validate()
            .map_err(|e| AuthError::Configuration(e.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            options,
        })
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    /// Build the browser-facing authorization URL with PKCE parameters.
    ///
    /// Generates a fresh code verifier per call; `state` is generated when
    /// the caller does not supply one. Pure aside from randomness.
    pub fn authorization_url(&self, state: Option<&str>) -> AuthorizationSession {
        let state = state
            .map(str::to_string)
            .unwrap_or_else(|| pkce::random_state(32));
        let code_verifier = pkce::generate_code_verifier();
        let code_challenge = pkce::compute_code_challenge(&code_verifier);
        let scope = self.options.scope_string();

        let params = [
            ("response_type", "code"),
            ("client_id", self.options.client_id.as_str()),
            ("redirect_uri", self.options.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("state", state.as_str()),
            ("code_challenge", code_challenge.as_str()),
            ("code_challenge_method", "S256"),
        ];

        let authorize_url =
            pkce::build_url_with_params(&self.options.authorization_endpoint, &params);

        AuthorizationSession {
            authorize_url,
            state,
            code_verifier,
        }
    }

    /// Exchange an authorization code for an access token.
    ///
    /// Empty or whitespace `code`/`code_verifier` are rejected before any
    /// request is made.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<AccessToken, AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::InvalidArgument(
                "authorization code must not be empty".to_string(),
            ));
        }
        if code_verifier.trim().is_empty() {
            return Err(AuthError::InvalidArgument(
                "code verifier must not be empty".to_string(),
            ));
        }

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.options.redirect_uri.as_str()),
            ("client_id", self.options.client_id.as_str()),
            ("code_verifier", code_verifier),
        ];
        if let Some(secret) = self.options.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        self.post_token_request(&form).await
    }

    /// Obtain a new access token via the refresh-token grant.
    ///
    /// When the response omits a refresh token the one used for the
    /// request is carried forward.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidArgument(
                "refresh token must not be empty".to_string(),
            ));
        }

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.options.client_id.as_str()),
        ];
        if let Some(secret) = self.options.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let mut token = self.post_token_request(&form).await?;
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    async fn post_token_request(&self, form: &[(&str, &str)]) -> Result<AccessToken, AuthError> {
        let resp = self
            .client
            .post(&self.options.token_endpoint)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                message,
            });
        }

        let payload: TokenResponse = resp.json().await?;
        Ok(payload.into_access_token())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: i64,
    refresh_token: Option<String>,
    scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    fn into_access_token(self) -> AccessToken {
        AccessToken {
            access_token: self.access_token,
            token_type: self.token_type,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            refresh_token: self.refresh_token,
            scopes: self
                .scope
                .map(|s| s.split_whitespace().map(String::from).collect()),
        }
    }
}
