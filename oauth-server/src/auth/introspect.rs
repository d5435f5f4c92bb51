//! Token introspection and revocation, layered on the token store, plus
//! read-only client application introspection.

use super::AuthorizationServer;
use crate::errors::AuthError;
use crate::models::{AccessToken, ApplicationInfo};
use log::debug;

impl AuthorizationServer {
    /// Validate a bearer token: it must exist, still carry its `valid`
    /// flag and not be past `created_at + expires_in`.
    ///
    /// Read-only and side-effect free, safe to call repeatedly and
    /// concurrently; expired records are left for the store to
    /// garbage-collect.
    pub async fn validate_token(&self, token: &str) -> Result<AccessToken, AuthError> {
        let token = self
            .tokens
            .get(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if !token.valid || token.is_expired() {
            return Err(AuthError::InvalidToken);
        }
        Ok(token)
    }

    /// Revoke a token. Returns true exactly once per live token; unknown
    /// or already-revoked tokens yield false. Deliberately exception-free
    /// on the OAuth level so it is safe to call speculatively.
    pub async fn revoke_token(&self, token: &str) -> Result<bool, AuthError> {
        let revoked = self
            .tokens
            .invalidate(token)
            .await?
            .unwrap_or(false);
        debug!("revoke token: revoked={}", revoked);
        Ok(revoked)
    }

    /// Public metadata of a registered client, without the secret.
    pub async fn get_application_info(&self, client_id: &str) -> Result<ApplicationInfo, AuthError> {
        self.clients()
            .lookup(client_id)
            .await?
            .map(ApplicationInfo::from)
            .ok_or(AuthError::InvalidClientId)
    }

    /// Public metadata of every registered client.
    pub async fn list_applications(&self) -> Result<Vec<ApplicationInfo>, AuthError> {
        self.clients().list_all().await
    }
}
