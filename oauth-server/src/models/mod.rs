//! Domain entities of the authorization server: client applications,
//! scopes, authorization codes and access tokens.

pub(crate) mod client;
pub(crate) mod code;
pub(crate) mod scope;
pub(crate) mod token;

pub(crate) use client::{ApplicationInfo, ClientApplication, ClientStatus};
pub(crate) use code::AuthorizationCode;
pub(crate) use scope::{is_subset, scope_names, Scope};
pub(crate) use token::AccessToken;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::Rng;

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Generate a cryptographically random, URL-safe opaque value.
///
/// Used for client ids/secrets, authorization codes and token values.
/// The output is base64url without padding, so it can travel in query
/// strings unescaped.
pub(crate) fn generate_secret(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    let raw: Vec<u8> = (0..bytes).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secrets_are_unique() {
        let a = generate_secret(32);
        let b = generate_secret(32);
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_generated_secrets_are_url_safe() {
        let secret = generate_secret(32);
        assert!(!secret.contains('+'));
        assert!(!secret.contains('/'));
        assert!(!secret.contains('='));
    }
}
