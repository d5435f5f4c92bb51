use crate::models::{generate_secret, unix_now};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether a client application may take part in grant flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Inactive,
}

/// A registered client application.
///
/// `client_id` and `client_secret` are generated at registration and never
/// change afterwards. Applications are never deleted, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClientApplication {
    /// Server-generated unique client identifier
    pub client_id: String,
    /// Server-generated client secret, never regenerated
    pub client_secret: String,
    /// Application name
    pub name: String,
    /// Application description
    #[serde(default)]
    pub description: String,
    /// Registered callback URI, bound to issued codes and verified at redemption
    pub redirect_uri: String,
    /// Space-separated scope names the client may request
    pub scope: String,
    /// Active or inactive; inactive clients fail authentication
    pub status: ClientStatus,
    /// Registration time, unix seconds
    pub created_at: u64,
}

impl ClientApplication {
    /// Create a freshly registered application with generated credentials.
    pub fn register(name: String, description: String, redirect_uri: String, scope: String) -> Self {
        Self {
            client_id: generate_secret(16),
            client_secret: generate_secret(32),
            name,
            description,
            redirect_uri,
            scope,
            status: ClientStatus::Active,
            created_at: unix_now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ClientStatus::Active
    }
}

/// Public view of a client application, safe to expose to introspection
/// callers: everything but the secret.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApplicationInfo {
    pub client_id: String,
    pub name: String,
    pub description: String,
    pub redirect_uri: String,
    pub scope: String,
    pub status: ClientStatus,
    pub created_at: u64,
}

impl From<ClientApplication> for ApplicationInfo {
    fn from(client: ClientApplication) -> Self {
        Self {
            client_id: client.client_id,
            name: client.name,
            description: client.description,
            redirect_uri: client.redirect_uri,
            scope: client.scope,
            status: client.status,
            created_at: client.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ClientApplication {
        ClientApplication::register(
            "Test App".to_string(),
            "a test application".to_string(),
            "https://example.com/callback".to_string(),
            "basic".to_string(),
        )
    }

    #[test]
    fn test_registered_client_is_active_with_credentials() {
        let client = test_client();
        assert!(client.is_active());
        assert!(!client.client_id.is_empty());
        assert!(!client.client_secret.is_empty());
        assert_ne!(client.client_id, client.client_secret);
    }

    #[test]
    fn test_inactive_client_is_not_active() {
        let mut client = test_client();
        client.status = ClientStatus::Inactive;
        assert!(!client.is_active());
    }

    #[test]
    fn test_application_info_does_not_expose_secret() {
        let client = test_client();
        let secret = client.client_secret.clone();
        let info = ApplicationInfo::from(client);
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains(&secret));
        assert!(json.contains(&info.client_id));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ClientStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&ClientStatus::Inactive).unwrap(),
            "\"inactive\""
        );
    }
}
