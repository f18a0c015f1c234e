//! OAuth2 PKCE flow, token management, and token storage.

pub mod error;
pub mod flow;
pub mod manager;
pub mod pkce;
pub mod store;
pub mod token;

pub use error::AuthError;
pub use flow::{AuthorizationSession, OAuthFlow};
pub use manager::TokenManager;
pub use store::{FileTokenStorage, MemoryTokenStorage, StorageConfig, TokenStorage};
pub use token::AccessToken;
