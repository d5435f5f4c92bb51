use crate::models::{generate_secret, unix_now};
use serde::{Deserialize, Serialize};

/// A short-lived, single-use authorization code.
///
/// Bound at issuance to the client and its registered redirect URI; both
/// bindings are re-verified at redemption. Redemption consumes the code
/// atomically at the storage layer, so concurrent attempts see exactly one
/// winner. Expiry is evaluated lazily at redemption time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// Opaque code value, server-generated
    pub code: String,
    /// Client the code was issued to
    pub client_id: String,
    /// Redirect URI the code is bound to
    pub redirect_uri: String,
    /// Space-separated scope carried into the issued token
    pub scope: String,
    /// Opaque client state echoed back on the redirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Issuance time, unix seconds
    pub created_at: u64,
    /// Lifetime in seconds, fixed by configuration
    pub expires_in: u64,
    /// Cleared on redemption
    pub valid: bool,
}

impl AuthorizationCode {
    pub fn issue(
        client_id: String,
        redirect_uri: String,
        scope: String,
        state: Option<String>,
        expires_in: u64,
    ) -> Self {
        Self {
            code: generate_secret(32),
            client_id,
            redirect_uri,
            scope,
            state,
            created_at: unix_now(),
            expires_in,
            valid: true,
        }
    }

    pub fn is_expired(&self) -> bool {
        unix_now() >= self.created_at + self.expires_in
    }
}
