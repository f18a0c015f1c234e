use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// OAuth access token issued by the Procore token endpoint.
///
/// Immutable once created: a refresh produces a new `AccessToken` rather
/// than mutating the old one.
///
/// # Example
/// ```no_run
/// use gantry::auth::AccessToken;
/// use chrono::{Duration, Utc};
///
/// let token = AccessToken {
///     access_token: "access".to_string(),
///     token_type: "Bearer".to_string(),
///     expires_at: Utc::now() + Duration::hours(2),
///     refresh_token: Some("refresh".to_string()),
///     scopes: None,
/// };
/// assert!(!token.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: Option<String>,
    pub scopes: Option<Vec<String>>,
}

impl AccessToken {
    /// Whether the token's expiry is in the past.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whether the token expires within `margin` from now.
    ///
    /// Used by the manager to refresh slightly ahead of the hard expiry.
    pub fn expires_within(&self, margin: Duration) -> bool {
        Utc::now() >= self.expires_at - margin
    }
}
