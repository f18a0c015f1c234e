//! Cached access-token manager with margin-aware refresh.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::logging::{self, OperationScope};

use super::error::AuthError;
use super::flow::OAuthFlow;
use super::store::TokenStorage;
use super::token::AccessToken;

/// Manages the current access token: expiry checking, refresh via the
/// refresh-token grant, and persistence through injected storage.
///
/// Two logical states: *valid* (stored token expiring beyond the refresh
/// margin) and *invalid* (no token, or expired with no refresh path).
/// Refresh is single-flight: concurrent callers that find an expired
/// token serialize on an async mutex and re-check storage after acquiring
/// it, so one refresh serves all of them. The storage backend's own lock
/// is never held across the network call.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use gantry::auth::{MemoryTokenStorage, OAuthFlow, TokenManager};
/// use gantry::config::AuthOptions;
///
/// let options = AuthOptions::new("client-id", "https://localhost:8080/callback");
/// let flow = OAuthFlow::new(options)?;
/// let manager = TokenManager::new(Arc::new(MemoryTokenStorage::new()), flow);
/// # Ok::<(), gantry::auth::AuthError>(())
/// ```
pub struct TokenManager {
    storage: Arc<dyn TokenStorage>,
    flow: OAuthFlow,
    storage_key: String,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(storage: Arc<dyn TokenStorage>, flow: OAuthFlow) -> Self {
        let storage_key = format!("procore-{}", flow.options().client_id);
        Self {
            storage,
            flow,
            storage_key,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Key under which this manager persists its token.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Return the current access token, refreshing it when it has expired
    /// or is about to.
    ///
    /// Errors with [`AuthError::NotAuthenticated`] when storage holds no
    /// token, and [`AuthError::ReauthenticationRequired`] when a refresh
    /// was needed but failed (storage is cleared in that case).
    pub async fn get_access_token(&self) -> Result<AccessToken, AuthError> {
        let margin = self.flow.options().refresh_margin;

        let token = self
            .storage
            .load(&self.storage_key)?
            .ok_or(AuthError::NotAuthenticated)?;
        if !token.expires_within(margin) {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have finished refreshing while we waited.
        let token = self
            .storage
            .load(&self.storage_key)?
            .ok_or(AuthError::NotAuthenticated)?;
        if !token.expires_within(margin) {
            return Ok(token);
        }

        let Some(refresh_token) = token.refresh_token.clone() else {
            tracing::debug!("access token expired and no refresh token is available");
            return Err(AuthError::ReauthenticationRequired(
                "access token expired and no refresh token is available".to_string(),
            ));
        };

        self.refresh_with(&refresh_token).await
    }

    /// Force a refresh of the stored token, regardless of its expiry.
    ///
    /// Used by the client layer after a 401 from the API. Fails with
    /// [`AuthError::ReauthenticationRequired`] (and clears storage) when
    /// the grant is rejected.
    pub async fn refresh(&self) -> Result<AccessToken, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        let token = self
            .storage
            .load(&self.storage_key)?
            .ok_or(AuthError::NotAuthenticated)?;
        let Some(refresh_token) = token.refresh_token.clone() else {
            return Err(AuthError::ReauthenticationRequired(
                "no refresh token is available".to_string(),
            ));
        };

        self.refresh_with(&refresh_token).await
    }

    /// Overwrite the stored token. Safe against concurrent readers.
    pub fn store_token(&self, token: &AccessToken) -> Result<(), AuthError> {
        self.storage.save(&self.storage_key, token)?;
        tracing::debug!("access token stored");
        Ok(())
    }

    /// Remove the stored token (logout).
    pub fn clear(&self) -> Result<(), AuthError> {
        self.storage.clear(&self.storage_key)?;
        tracing::debug!("access token cleared");
        Ok(())
    }

    // Caller must hold `refresh_lock`.
    async fn refresh_with(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        let scope = OperationScope::start("token_refresh", logging::correlation_id());
        match self.flow.refresh(refresh_token).await {
            Ok(new_token) => {
                self.storage.save(&self.storage_key, &new_token)?;
                scope.finish(true);
                Ok(new_token)
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh failed, clearing stored token");
                self.storage.clear(&self.storage_key)?;
                scope.finish(false);
                Err(AuthError::ReauthenticationRequired(err.to_string()))
            }
        }
    }
}
