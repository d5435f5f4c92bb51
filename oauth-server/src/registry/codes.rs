use crate::errors::AuthError;
use crate::models::AuthorizationCode;
use crate::storage::{Storage, StorageBackend};
use log::debug;
use std::sync::Arc;

/// Store of single-use authorization codes.
///
/// Codes carry a fixed lifetime from configuration, not from any scope.
/// Consumption is atomic: the storage take is the single step that makes a
/// code unusable, so concurrent redemptions see exactly one winner.
#[derive(Clone)]
pub struct CodeStore {
    storage: Arc<Storage>,
    code_ttl: u64,
}

impl CodeStore {
    pub fn new(storage: Arc<Storage>, code_ttl: u64) -> Self {
        Self { storage, code_ttl }
    }

    /// Generate and persist a fresh code bound to the client and its
    /// redirect URI.
    pub async fn issue(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scope: &str,
        state: Option<String>,
    ) -> Result<AuthorizationCode, AuthError> {
        let code = AuthorizationCode::issue(
            client_id.to_string(),
            redirect_uri.to_string(),
            scope.to_string(),
            state,
            self.code_ttl,
        );
        self.storage.put_code(&code).await?;
        debug!(
            "issued authorization code for client {} with scope '{}', expires in {}s",
            client_id, scope, self.code_ttl
        );
        Ok(code)
    }

    /// Atomically consume a code. Returns the stored record to the single
    /// caller that wins; every other caller gets `None`.
    pub async fn consume(&self, code: &str) -> Result<Option<AuthorizationCode>, AuthError> {
        Ok(self.storage.take_code(code).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn test_store() -> CodeStore {
        CodeStore::new(Arc::new(Storage::InMemory(MemoryStorage::new())), 600)
    }

    #[tokio::test]
    async fn test_issue_and_consume_once() {
        let store = test_store();
        let code = store
            .issue("client-1", "https://example.com/cb", "basic", None)
            .await
            .unwrap();
        assert_eq!(code.expires_in, 600);

        let consumed = store.consume(&code.code).await.unwrap().unwrap();
        assert_eq!(consumed.client_id, "client-1");
        assert_eq!(consumed.scope, "basic");

        assert!(store.consume(&code.code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_state_is_preserved() {
        let store = test_store();
        let code = store
            .issue(
                "client-1",
                "https://example.com/cb",
                "basic",
                Some("xyz".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(code.state.as_deref(), Some("xyz"));
    }
}
