use crate::models::{generate_secret, unix_now};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The `token_type` of every token this server issues.
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// An issued access token, possibly paired with a refresh token.
///
/// `expires_in` is copied from the issuing scope's grant-specific expiry at
/// issuance time and never changes afterwards; expiry is evaluated lazily
/// against `created_at`. Revocation flips `valid` and keeps the record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessToken {
    /// Opaque bearer token value
    pub token: String,
    /// Refresh token, present for grants that support renewal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Always "Bearer"
    pub token_type: String,
    /// Lifetime in seconds, captured from the scope at issuance
    pub expires_in: u64,
    /// Space-separated scope granted to the token
    pub scope: String,
    /// Client the token was issued to
    pub client_id: String,
    /// Resource-owner identifier for the password flow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Issuance time, unix seconds
    pub created_at: u64,
    /// Cleared on revocation or refresh rotation
    pub valid: bool,
}

impl AccessToken {
    /// Mint a new token. `with_refresh` controls whether a refresh token is
    /// attached (client_credentials tokens carry none).
    pub fn issue(
        client_id: String,
        scope: String,
        expires_in: u64,
        with_refresh: bool,
        user_id: Option<String>,
    ) -> Self {
        Self {
            token: generate_secret(32),
            refresh_token: with_refresh.then(|| generate_secret(32)),
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in,
            scope,
            client_id,
            user_id,
            created_at: unix_now(),
            valid: true,
        }
    }

    pub fn is_expired(&self) -> bool {
        unix_now() >= self.created_at + self.expires_in
    }
}
