use crate::errors::AuthError;
use crate::models::{ApplicationInfo, ClientApplication, ClientStatus};
use crate::registry::ScopeRegistry;
use crate::storage::{Storage, StorageBackend};
use log::{debug, info};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;
use utoipa::ToSchema;

/// Registration payload for a new client application.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterClientRequest {
    /// Application name
    pub name: String,
    /// Application description
    #[serde(default)]
    pub description: String,
    /// Absolute callback URI
    pub redirect_uri: String,
    /// Space-separated scope names the client wants to be entitled to
    pub scope: String,
}

/// Partial update of a registered client application, authenticated with
/// the client's own credentials. `client_id`/`client_secret` are immutable.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateClientRequest {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ClientStatus>,
}

/// Registry of client applications and their credentials.
#[derive(Clone)]
pub struct ClientRegistry {
    storage: Arc<Storage>,
}

impl ClientRegistry {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Register a new client application with generated credentials.
    ///
    /// The redirect URI must parse as an absolute URI without a fragment;
    /// every requested scope name must already be registered.
    pub async fn register(
        &self,
        request: &RegisterClientRequest,
        scopes: &ScopeRegistry,
    ) -> Result<ClientApplication, AuthError> {
        if request.name.trim().is_empty() {
            return Err(AuthError::InvalidRequest(
                "application name is required".to_string(),
            ));
        }
        validate_redirect_uri(&request.redirect_uri)?;
        if !scopes.all_registered(&request.scope).await? {
            return Err(AuthError::InvalidRequest(
                "scope is missing or contains unregistered scope names".to_string(),
            ));
        }

        let client = ClientApplication::register(
            request.name.clone(),
            request.description.clone(),
            request.redirect_uri.clone(),
            request.scope.clone(),
        );
        self.storage.put_client(&client).await?;
        info!("registered client application {}", client.client_id);
        Ok(client)
    }

    pub async fn lookup(&self, client_id: &str) -> Result<Option<ClientApplication>, AuthError> {
        Ok(self.storage.get_client(client_id).await?)
    }

    /// Authenticate a client by exact secret match. Inactive clients fail.
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<ClientApplication, AuthError> {
        let client = self
            .storage
            .get_client(client_id)
            .await?
            .ok_or(AuthError::InvalidClient)?;
        if client.client_secret != client_secret || !client.is_active() {
            debug!("client authentication failed for {}", client_id);
            return Err(AuthError::InvalidClient);
        }
        Ok(client)
    }

    /// Apply a partial update. New scope/redirect_uri values are validated
    /// the same way as at registration.
    pub async fn update(
        &self,
        request: &UpdateClientRequest,
        scopes: &ScopeRegistry,
    ) -> Result<ClientApplication, AuthError> {
        let mut client = self.authenticate(&request.client_id, &request.client_secret).await?;

        if let Some(redirect_uri) = &request.redirect_uri {
            validate_redirect_uri(redirect_uri)?;
            client.redirect_uri = redirect_uri.clone();
        }
        if let Some(scope) = &request.scope {
            if !scopes.all_registered(scope).await? {
                return Err(AuthError::InvalidRequest(
                    "scope contains unregistered scope names".to_string(),
                ));
            }
            client.scope = scope.clone();
        }
        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(AuthError::InvalidRequest(
                    "application name must not be empty".to_string(),
                ));
            }
            client.name = name.clone();
        }
        if let Some(description) = &request.description {
            client.description = description.clone();
        }
        if let Some(status) = request.status {
            client.status = status;
        }

        self.storage.put_client(&client).await?;
        info!("updated client application {}", client.client_id);
        Ok(client)
    }

    pub async fn list_all(&self) -> Result<Vec<ApplicationInfo>, AuthError> {
        let clients = self.storage.all_clients().await?;
        Ok(clients.into_iter().map(ApplicationInfo::from).collect())
    }
}

fn validate_redirect_uri(redirect_uri: &str) -> Result<(), AuthError> {
    let url = Url::parse(redirect_uri).map_err(|_| {
        AuthError::InvalidRequest("redirect_uri must be an absolute URI".to_string())
    })?;
    if url.fragment().is_some() {
        return Err(AuthError::InvalidRequest(
            "redirect_uri must not contain a fragment".to_string(),
        ));
    }
    Ok(())
}
