use crate::errors::AuthError;
use crate::models::AccessToken;
use crate::storage::{Storage, StorageBackend};
use log::debug;
use std::sync::Arc;

/// Store of issued access tokens and the refresh-token index.
///
/// Tokens are never physically deleted; revocation and refresh rotation
/// flip the `valid` flag through the storage backend's conditional update.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Mint and persist a new access token; the refresh token, when minted,
    /// is indexed back to the access token value.
    pub async fn issue(
        &self,
        client_id: &str,
        scope: &str,
        expires_in: u64,
        with_refresh: bool,
        user_id: Option<String>,
    ) -> Result<AccessToken, AuthError> {
        let token = AccessToken::issue(
            client_id.to_string(),
            scope.to_string(),
            expires_in,
            with_refresh,
            user_id,
        );
        self.storage.put_token(&token).await?;
        if let Some(refresh_token) = &token.refresh_token {
            self.storage.put_refresh(refresh_token, &token.token).await?;
        }
        debug!(
            "issued access token to client {} with scope '{}', expires in {}s",
            client_id, scope, expires_in
        );
        Ok(token)
    }

    pub async fn get(&self, token: &str) -> Result<Option<AccessToken>, AuthError> {
        Ok(self.storage.get_token(token).await?)
    }

    /// Conditionally flip the token's `valid` flag; see
    /// [`crate::storage::StorageBackend::invalidate_token`].
    pub async fn invalidate(&self, token: &str) -> Result<Option<bool>, AuthError> {
        Ok(self.storage.invalidate_token(token).await?)
    }

    /// Atomically consume a refresh token and load its parent access token.
    /// The single winner of a concurrent exchange gets the parent record;
    /// everyone else gets `None`.
    pub async fn consume_refresh(
        &self,
        refresh_token: &str,
    ) -> Result<Option<AccessToken>, AuthError> {
        match self.storage.take_refresh(refresh_token).await? {
            None => Ok(None),
            Some(access_token) => Ok(self.storage.get_token(&access_token).await?),
        }
    }
}
