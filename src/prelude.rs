//! Convenience re-exports for common use.

pub use crate::auth::flow::{AuthorizationSession, OAuthFlow};
pub use crate::auth::manager::TokenManager;
pub use crate::auth::store::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
pub use crate::auth::{AccessToken, AuthError};
pub use crate::client::AuthedClient;
pub use crate::config::AuthOptions;
pub use crate::error::{GantryError, Result};
