use crate::auth::AuthorizationServer;
use crate::config::OAuthConfig;
use crate::hooks::LifecycleHooks;
use crate::storage::{create_storage, Storage, StorageBackend, StorageError};
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<OAuthConfig>,
    pub storage: Arc<Storage>,
    pub auth: Arc<AuthorizationServer>,
    pub hooks: Arc<LifecycleHooks>,
}

impl AppState {
    /// Create state with the storage backend selected by configuration.
    pub async fn new(config: OAuthConfig) -> Result<Self, StorageError> {
        let storage = Arc::new(create_storage(&config).await?);
        Ok(Self::with_existing_storage(config, storage))
    }

    /// Create state around an already-initialized storage backend.
    pub fn with_existing_storage(config: OAuthConfig, storage: Arc<Storage>) -> Self {
        let auth = Arc::new(AuthorizationServer::new(storage.clone(), &config));
        Self {
            config: Arc::new(config),
            storage,
            auth,
            hooks: Arc::new(LifecycleHooks::standard()),
        }
    }

    /// Check if all components are healthy
    pub async fn health_check(&self) -> bool {
        self.storage.health_check().await.is_ok()
    }
}
