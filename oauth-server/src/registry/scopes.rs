use crate::errors::AuthError;
use crate::models::{is_subset, scope_names, ClientApplication, Scope};
use crate::storage::{Storage, StorageBackend};
use log::debug;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Which of a scope's two lifetimes applies to a token being issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantClass {
    /// client_credentials and authorization_code grants
    ClientCredentials,
    /// password and refresh_token grants
    Password,
}

/// Partial update of a registered scope. The name identifies the scope and
/// cannot change.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateScopeRequest {
    /// Name of the scope to update
    pub name: String,
    pub description: Option<String>,
    pub cc_expires_in: Option<u64>,
    pub pass_expires_in: Option<u64>,
}

/// Registry of named scope definitions and their grant-specific lifetimes.
#[derive(Clone)]
pub struct ScopeRegistry {
    storage: Arc<Storage>,
    /// Token lifetime used when no named scope resolves to a definition
    default_expires_in: u64,
}

impl ScopeRegistry {
    pub fn new(storage: Arc<Storage>, default_expires_in: u64) -> Self {
        Self {
            storage,
            default_expires_in,
        }
    }

    /// Register a new scope. Invalid definitions and duplicate names are
    /// rejected; the duplicate check is an atomic insert at the storage
    /// layer.
    pub async fn register(&self, scope: &Scope) -> Result<(), AuthError> {
        if !scope.validate() {
            return Err(AuthError::InvalidRequest(
                "scope name must have at least 2 characters, description must be present and both expiry fields must be positive".to_string(),
            ));
        }
        if !self.storage.insert_scope(scope).await? {
            return Err(AuthError::InvalidRequest(format!(
                "scope {} already exists",
                scope.name
            )));
        }
        debug!("registered scope {}", scope.name);
        Ok(())
    }

    /// Partially update a scope; the result must still be a valid scope.
    pub async fn update(&self, update: &UpdateScopeRequest) -> Result<Scope, AuthError> {
        let mut scope = self
            .storage
            .get_scope(&update.name)
            .await?
            .ok_or(AuthError::ScopeNotFound)?;

        if let Some(description) = &update.description {
            scope.description = description.clone();
        }
        if let Some(cc_expires_in) = update.cc_expires_in {
            scope.cc_expires_in = cc_expires_in;
        }
        if let Some(pass_expires_in) = update.pass_expires_in {
            scope.pass_expires_in = pass_expires_in;
        }
        if !scope.validate() {
            return Err(AuthError::InvalidRequest(
                "updated scope would not be valid".to_string(),
            ));
        }

        self.storage.put_scope(&scope).await?;
        debug!("updated scope {}", scope.name);
        Ok(scope)
    }

    pub async fn get(&self, name: &str) -> Result<Scope, AuthError> {
        self.storage
            .get_scope(name)
            .await?
            .ok_or(AuthError::ScopeNotFound)
    }

    pub async fn get_all(&self) -> Result<Vec<Scope>, AuthError> {
        Ok(self.storage.all_scopes().await?)
    }

    /// Delete a scope by name. Tokens already issued under it keep the
    /// expiry captured at issuance.
    pub async fn delete(&self, name: &str) -> Result<(), AuthError> {
        if !self.storage.delete_scope(name).await? {
            return Err(AuthError::ScopeNotFound);
        }
        debug!("deleted scope {}", name);
        Ok(())
    }

    /// Whether every name in the scope string is registered.
    pub async fn all_registered(&self, scope: &str) -> Result<bool, AuthError> {
        let names = scope_names(scope);
        if names.is_empty() {
            return Ok(false);
        }
        for name in names {
            if self.storage.get_scope(name).await?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Resolve the effective scope of a request against a client's
    /// entitlement: an absent scope defaults to the client's registered
    /// scope, anything else must be a non-empty subset of it.
    pub async fn valid_scope_for_client(
        &self,
        requested: Option<&str>,
        client: &ClientApplication,
    ) -> Result<String, AuthError> {
        match requested {
            None => Ok(client.scope.clone()),
            Some(scope) if is_subset(scope, &client.scope) => Ok(scope.to_string()),
            Some(_) => Err(AuthError::InvalidScope),
        }
    }

    /// Token lifetime for a scope string under the given grant class: the
    /// minimum across the named scopes' grant-specific expiries, or the
    /// configured default when none of the names resolves.
    pub async fn expires_in_for(
        &self,
        grant: GrantClass,
        scope: &str,
    ) -> Result<u64, AuthError> {
        let mut expires_in: Option<u64> = None;
        for name in scope_names(scope) {
            if let Some(scope) = self.storage.get_scope(name).await? {
                let candidate = match grant {
                    GrantClass::ClientCredentials => scope.cc_expires_in,
                    GrantClass::Password => scope.pass_expires_in,
                };
                expires_in = Some(expires_in.map_or(candidate, |current| current.min(candidate)));
            }
        }
        Ok(expires_in.unwrap_or(self.default_expires_in))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn test_registry() -> ScopeRegistry {
        ScopeRegistry::new(Arc::new(Storage::InMemory(MemoryStorage::new())), 1800)
    }

    fn scope(name: &str, cc: u64, pass: u64) -> Scope {
        Scope {
            name: name.to_string(),
            description: "some description".to_string(),
            cc_expires_in: cc,
            pass_expires_in: pass,
        }
    }

    fn client_with_scope(scope: &str) -> ClientApplication {
        ClientApplication::register(
            "App".to_string(),
            "descr".to_string(),
            "https://example.com/cb".to_string(),
            scope.to_string(),
        )
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_scope() {
        let registry = test_registry();
        let result = registry.register(&scope("b", 300, 100)).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_name() {
        let registry = test_registry();
        registry.register(&scope("basic", 300, 100)).await.unwrap();
        let result = registry.register(&scope("basic", 600, 600)).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));
        // the original definition is untouched
        assert_eq!(registry.get("basic").await.unwrap().cc_expires_in, 300);
    }

    #[tokio::test]
    async fn test_update_merges_fields_and_validates() {
        let registry = test_registry();
        registry.register(&scope("basic", 300, 100)).await.unwrap();

        let updated = registry
            .update(&UpdateScopeRequest {
                name: "basic".to_string(),
                description: None,
                cc_expires_in: Some(900),
                pass_expires_in: None,
            })
            .await
            .unwrap();
        assert_eq!(updated.cc_expires_in, 900);
        assert_eq!(updated.pass_expires_in, 100);
        assert_eq!(updated.description, "some description");

        let result = registry
            .update(&UpdateScopeRequest {
                name: "basic".to_string(),
                description: None,
                cc_expires_in: Some(0),
                pass_expires_in: None,
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_update_unknown_scope_is_not_found() {
        let registry = test_registry();
        let result = registry
            .update(&UpdateScopeRequest {
                name: "missing".to_string(),
                description: None,
                cc_expires_in: None,
                pass_expires_in: None,
            })
            .await;
        assert!(matches!(result, Err(AuthError::ScopeNotFound)));
    }

    #[tokio::test]
    async fn test_delete() {
        let registry = test_registry();
        registry.register(&scope("basic", 300, 100)).await.unwrap();
        registry.delete("basic").await.unwrap();
        assert!(matches!(
            registry.delete("basic").await,
            Err(AuthError::ScopeNotFound)
        ));
        assert!(matches!(
            registry.get("basic").await,
            Err(AuthError::ScopeNotFound)
        ));
    }

    #[tokio::test]
    async fn test_all_registered() {
        let registry = test_registry();
        registry.register(&scope("basic", 300, 100)).await.unwrap();
        registry
            .register(&scope("extended", 600, 200))
            .await
            .unwrap();

        assert!(registry.all_registered("basic extended").await.unwrap());
        assert!(!registry.all_registered("basic admin").await.unwrap());
        assert!(!registry.all_registered("").await.unwrap());
    }

    #[tokio::test]
    async fn test_valid_scope_defaults_to_client_scope() {
        let registry = test_registry();
        let client = client_with_scope("basic extended");

        let resolved = registry
            .valid_scope_for_client(None, &client)
            .await
            .unwrap();
        assert_eq!(resolved, "basic extended");
    }

    #[tokio::test]
    async fn test_valid_scope_rejects_scope_outside_entitlement() {
        let registry = test_registry();
        // "admin" exists globally but the client is not entitled to it
        registry.register(&scope("admin", 300, 100)).await.unwrap();
        let client = client_with_scope("basic");

        let result = registry.valid_scope_for_client(Some("admin"), &client).await;
        assert!(matches!(result, Err(AuthError::InvalidScope)));
        let result = registry.valid_scope_for_client(Some(""), &client).await;
        assert!(matches!(result, Err(AuthError::InvalidScope)));
    }

    #[tokio::test]
    async fn test_expires_in_takes_the_minimum() {
        let registry = test_registry();
        registry.register(&scope("basic", 300, 100)).await.unwrap();
        registry
            .register(&scope("extended", 600, 50))
            .await
            .unwrap();

        assert_eq!(
            registry
                .expires_in_for(GrantClass::ClientCredentials, "basic extended")
                .await
                .unwrap(),
            300
        );
        assert_eq!(
            registry
                .expires_in_for(GrantClass::Password, "basic extended")
                .await
                .unwrap(),
            50
        );
    }

    #[tokio::test]
    async fn test_expires_in_falls_back_to_default() {
        let registry = test_registry();
        assert_eq!(
            registry
                .expires_in_for(GrantClass::ClientCredentials, "unknown")
                .await
                .unwrap(),
            1800
        );
    }
}
