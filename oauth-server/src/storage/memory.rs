use super::{StorageBackend, StorageError};
use crate::models::{AccessToken, AuthorizationCode, ClientApplication, Scope};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory storage backed by dashmap, used for development and tests.
///
/// dashmap gives per-key atomicity: `remove` is the conditional-take
/// primitive behind single-use codes and refresh rotation, and `get_mut`
/// holds the shard lock while the `valid` flag is flipped. Expired records
/// are not evicted here; expiry is evaluated lazily by the engine.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    clients: Arc<DashMap<String, ClientApplication>>,
    scopes: Arc<DashMap<String, Scope>>,
    codes: Arc<DashMap<String, AuthorizationCode>>,
    tokens: Arc<DashMap<String, AccessToken>>,
    refresh_index: Arc<DashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn put_client(&self, client: &ClientApplication) -> Result<(), StorageError> {
        self.clients
            .insert(client.client_id.clone(), client.clone());
        Ok(())
    }

    async fn get_client(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientApplication>, StorageError> {
        Ok(self.clients.get(client_id).map(|entry| entry.value().clone()))
    }

    async fn all_clients(&self) -> Result<Vec<ClientApplication>, StorageError> {
        Ok(self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn insert_scope(&self, scope: &Scope) -> Result<bool, StorageError> {
        match self.scopes.entry(scope.name.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(scope.clone());
                Ok(true)
            }
        }
    }

    async fn put_scope(&self, scope: &Scope) -> Result<(), StorageError> {
        self.scopes.insert(scope.name.clone(), scope.clone());
        Ok(())
    }

    async fn get_scope(&self, name: &str) -> Result<Option<Scope>, StorageError> {
        Ok(self.scopes.get(name).map(|entry| entry.value().clone()))
    }

    async fn all_scopes(&self) -> Result<Vec<Scope>, StorageError> {
        Ok(self
            .scopes
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_scope(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.scopes.remove(name).is_some())
    }

    async fn put_code(&self, code: &AuthorizationCode) -> Result<(), StorageError> {
        self.codes.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn take_code(&self, code: &str) -> Result<Option<AuthorizationCode>, StorageError> {
        Ok(self.codes.remove(code).map(|(_, value)| value))
    }

    async fn put_token(&self, token: &AccessToken) -> Result<(), StorageError> {
        self.tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn get_token(&self, token: &str) -> Result<Option<AccessToken>, StorageError> {
        Ok(self.tokens.get(token).map(|entry| entry.value().clone()))
    }

    async fn invalidate_token(&self, token: &str) -> Result<Option<bool>, StorageError> {
        match self.tokens.get_mut(token) {
            Some(mut entry) if entry.valid => {
                entry.valid = false;
                Ok(Some(true))
            }
            Some(_) => Ok(Some(false)),
            None => Ok(None),
        }
    }

    async fn put_refresh(
        &self,
        refresh_token: &str,
        access_token: &str,
    ) -> Result<(), StorageError> {
        self.refresh_index
            .insert(refresh_token.to_string(), access_token.to_string());
        Ok(())
    }

    async fn take_refresh(&self, refresh_token: &str) -> Result<Option<String>, StorageError> {
        Ok(self.refresh_index.remove(refresh_token).map(|(_, v)| v))
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}
