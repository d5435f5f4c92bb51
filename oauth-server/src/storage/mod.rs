use crate::models::{AccessToken, AuthorizationCode, ClientApplication, Scope};
use thiserror::Error;

pub mod memory;
pub mod redis;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to parse record: {0}")]
    Deserialization(String),
    #[error("redis error: {0}")]
    Redis(String),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Storage trait defining the persistence interface consumed by the engine.
///
/// Records are keyed by their identity field (client_id, scope name, code
/// value, token value). Implementations must be thread-safe (Send + Sync)
/// and cloneable so they can be shared across handlers.
///
/// Two operations carry per-record atomicity contracts on top of plain
/// CRUD, and the engine's correctness depends on them:
///
/// - `take_code` / `take_refresh` remove and return a record in a single
///   atomic step, so concurrent redemptions of the same code (or refresh
///   token) observe exactly one winner.
/// - `invalidate_token` is a conditional flip of the token's `valid` flag:
///   it returns `Some(true)` for the caller that actually flipped it,
///   `Some(false)` when the token was already invalid, and `None` when the
///   token is unknown. Concurrent revocations observe at most one
///   `Some(true)`.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    // Client applications, keyed by client_id.
    async fn put_client(&self, client: &ClientApplication) -> Result<(), StorageError>;
    async fn get_client(&self, client_id: &str)
        -> Result<Option<ClientApplication>, StorageError>;
    async fn all_clients(&self) -> Result<Vec<ClientApplication>, StorageError>;

    // Scopes, keyed by name.
    /// Insert a scope only if the name is free; returns whether it was inserted.
    async fn insert_scope(&self, scope: &Scope) -> Result<bool, StorageError>;
    async fn put_scope(&self, scope: &Scope) -> Result<(), StorageError>;
    async fn get_scope(&self, name: &str) -> Result<Option<Scope>, StorageError>;
    async fn all_scopes(&self) -> Result<Vec<Scope>, StorageError>;
    /// Returns whether a scope with that name existed.
    async fn delete_scope(&self, name: &str) -> Result<bool, StorageError>;

    // Authorization codes, keyed by code value.
    async fn put_code(&self, code: &AuthorizationCode) -> Result<(), StorageError>;
    /// Atomically remove and return the code.
    async fn take_code(&self, code: &str) -> Result<Option<AuthorizationCode>, StorageError>;

    // Access tokens, keyed by token value.
    async fn put_token(&self, token: &AccessToken) -> Result<(), StorageError>;
    async fn get_token(&self, token: &str) -> Result<Option<AccessToken>, StorageError>;
    /// Atomically flip the token's `valid` flag to false.
    async fn invalidate_token(&self, token: &str) -> Result<Option<bool>, StorageError>;

    // Refresh-token index: refresh token value -> access token value.
    async fn put_refresh(&self, refresh_token: &str, access_token: &str)
        -> Result<(), StorageError>;
    /// Atomically remove and return the indexed access token value.
    async fn take_refresh(&self, refresh_token: &str) -> Result<Option<String>, StorageError>;

    /// Performs a deep health check on the storage backend.
    async fn health_check(&self) -> Result<(), String>;
}

/// Storage implementation that provides a uniform interface regardless of
/// backend. The concrete implementation is chosen at startup from the
/// application configuration.
#[derive(Clone)]
pub enum Storage {
    /// In-memory storage backed by dashmap, for development and tests
    InMemory(memory::MemoryStorage),
    /// Redis-backed storage
    Redis(redis::RedisStorage),
}

macro_rules! dispatch {
    ($self:ident, $backend:ident, $call:expr) => {
        match $self {
            Self::InMemory($backend) => $call,
            Self::Redis($backend) => $call,
        }
    };
}

#[async_trait::async_trait]
impl StorageBackend for Storage {
    async fn put_client(&self, client: &ClientApplication) -> Result<(), StorageError> {
        dispatch!(self, backend, backend.put_client(client).await)
    }

    async fn get_client(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientApplication>, StorageError> {
        dispatch!(self, backend, backend.get_client(client_id).await)
    }

    async fn all_clients(&self) -> Result<Vec<ClientApplication>, StorageError> {
        dispatch!(self, backend, backend.all_clients().await)
    }

    async fn insert_scope(&self, scope: &Scope) -> Result<bool, StorageError> {
        dispatch!(self, backend, backend.insert_scope(scope).await)
    }

    async fn put_scope(&self, scope: &Scope) -> Result<(), StorageError> {
        dispatch!(self, backend, backend.put_scope(scope).await)
    }

    async fn get_scope(&self, name: &str) -> Result<Option<Scope>, StorageError> {
        dispatch!(self, backend, backend.get_scope(name).await)
    }

    async fn all_scopes(&self) -> Result<Vec<Scope>, StorageError> {
        dispatch!(self, backend, backend.all_scopes().await)
    }

    async fn delete_scope(&self, name: &str) -> Result<bool, StorageError> {
        dispatch!(self, backend, backend.delete_scope(name).await)
    }

    async fn put_code(&self, code: &AuthorizationCode) -> Result<(), StorageError> {
        dispatch!(self, backend, backend.put_code(code).await)
    }

    async fn take_code(&self, code: &str) -> Result<Option<AuthorizationCode>, StorageError> {
        dispatch!(self, backend, backend.take_code(code).await)
    }

    async fn put_token(&self, token: &AccessToken) -> Result<(), StorageError> {
        dispatch!(self, backend, backend.put_token(token).await)
    }

    async fn get_token(&self, token: &str) -> Result<Option<AccessToken>, StorageError> {
        dispatch!(self, backend, backend.get_token(token).await)
    }

    async fn invalidate_token(&self, token: &str) -> Result<Option<bool>, StorageError> {
        dispatch!(self, backend, backend.invalidate_token(token).await)
    }

    async fn put_refresh(
        &self,
        refresh_token: &str,
        access_token: &str,
    ) -> Result<(), StorageError> {
        dispatch!(
            self,
            backend,
            backend.put_refresh(refresh_token, access_token).await
        )
    }

    async fn take_refresh(&self, refresh_token: &str) -> Result<Option<String>, StorageError> {
        dispatch!(self, backend, backend.take_refresh(refresh_token).await)
    }

    async fn health_check(&self) -> Result<(), String> {
        dispatch!(self, backend, backend.health_check().await)
    }
}

/// Factory function creating the storage backend selected by configuration.
pub async fn create_storage(config: &crate::config::OAuthConfig) -> Result<Storage, StorageError> {
    match config.storage.store {
        crate::config::StorageKind::InMemory => {
            Ok(Storage::InMemory(memory::MemoryStorage::new()))
        }
        crate::config::StorageKind::Redis => {
            if config.storage.redis.url.is_empty() {
                return Err(StorageError::Config(
                    "Redis URL is required for Redis storage".to_string(),
                ));
            }
            let storage = redis::RedisStorage::new(&config.storage.redis.url)
                .await
                .map_err(StorageError::Config)?;
            Ok(Storage::Redis(storage))
        }
    }
}
