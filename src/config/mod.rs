//! Authentication configuration (code > env > .env file).

use chrono::Duration;

use crate::error::{GantryError, Result};

const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://app.procore.com/oauth/authorize";
const DEFAULT_TOKEN_ENDPOINT: &str = "https://api.procore.com/oauth/token";
const DEFAULT_BASE_URL: &str = "https://api.procore.com";
const DEFAULT_REFRESH_MARGIN_MINUTES: i64 = 5;

/// OAuth client configuration for the Procore platform.
///
/// Immutable after construction. Missing required fields are a fatal
/// construction-time error (`validate`), never a runtime error path.
///
/// # Example
/// ```
/// use gantry::config::AuthOptions;
///
/// let options = AuthOptions::new("my-client-id", "https://localhost:8080/callback")
///     .with_scopes(["read", "write"])
///     .validated()
///     .unwrap();
/// assert_eq!(options.client_id, "my-client-id");
/// ```
#[derive(Debug, Clone)]
pub struct AuthOptions {
    pub client_id: String,
    /// Absent for public clients; PKCE carries the proof instead.
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub base_url: String,
    /// Margin before expiry at which a refresh is triggered.
    pub refresh_margin: Duration,
}

impl AuthOptions {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_margin: Duration::minutes(DEFAULT_REFRESH_MARGIN_MINUTES),
        }
    }

    /// Load options from `PROCORE_*` environment variables (a `.env` file
    /// is honored if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let client_id = std::env::var("PROCORE_CLIENT_ID").map_err(|_| {
            GantryError::Configuration("PROCORE_CLIENT_ID is not set".to_string())
        })?;
        let redirect_uri = std::env::var("PROCORE_REDIRECT_URI").map_err(|_| {
            GantryError::Configuration("PROCORE_REDIRECT_URI is not set".to_string())
        })?;

        let mut options = Self::new(client_id, redirect_uri);
        if let Ok(secret) = std::env::var("PROCORE_CLIENT_SECRET") {
            options.client_secret = Some(secret);
        }
        if let Ok(scopes) = std::env::var("PROCORE_SCOPES") {
            options.scopes = scopes.split_whitespace().map(String::from).collect();
        }
        if let Ok(url) = std::env::var("PROCORE_AUTH_ENDPOINT") {
            options.authorization_endpoint = url;
        }
        if let Ok(url) = std::env::var("PROCORE_TOKEN_ENDPOINT") {
            options.token_endpoint = url;
        }
        if let Ok(url) = std::env::var("PROCORE_BASE_URL") {
            options.base_url = url;
        }
        options.validate()?;
        Ok(options)
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_authorization_endpoint(mut self, url: impl Into<String>) -> Self {
        self.authorization_endpoint = url.into();
        self
    }

    pub fn with_token_endpoint(mut self, url: impl Into<String>) -> Self {
        self.token_endpoint = url.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Check that all required fields are present and well-formed.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(GantryError::Configuration(
                "client_id must not be empty".to_string(),
            ));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(GantryError::Configuration(
                "redirect_uri must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("authorization_endpoint", &self.authorization_endpoint),
            ("token_endpoint", &self.token_endpoint),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(GantryError::Configuration(format!(
                    "{name} must be an http(s) URL, got {value:?}"
                )));
            }
        }
        Ok(())
    }

    /// `validate` as a builder terminator.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Scopes joined the way the authorize endpoint expects them.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}
