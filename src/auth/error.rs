use thiserror::Error;

use crate::error::GantryError;

/// Normalized authentication errors for the OAuth flow and token manager.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Re-authentication required: {0}")]
    ReauthenticationRequired(String),
    #[error("Token endpoint returned status {status}: {message}")]
    TokenEndpoint { status: u16, message: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for GantryError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Configuration(msg) => GantryError::Configuration(msg),
            AuthError::InvalidArgument(msg) => GantryError::InvalidArgument(msg),
            AuthError::TokenEndpoint { status, message } => GantryError::Api { status, message },
            other => GantryError::Authentication(other.to_string()),
        }
    }
}
