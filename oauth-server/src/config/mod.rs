pub(crate) use crate::config::storage::{RedisStorageConfig, StorageConfig, StorageKind};
pub(crate) use crate::config::token::TokenConfig;
use config::{Config as ConfigCrate, ConfigError};
use serde::Deserialize;

pub mod storage;
pub mod token;

/// Main configuration structure for the authorization server.
///
/// Loaded from `OAUTH_`-prefixed environment variables; nesting uses a
/// double underscore (e.g. `OAUTH_STORAGE__REDIS__URL`).
#[derive(Debug, Deserialize, Clone)]
pub struct OAuthConfig {
    /// The port the server will listen on (default: 8888)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Storage backend configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Token and authorization-code policy
    #[serde(default)]
    pub token: TokenConfig,
}

fn default_port() -> u16 {
    8888
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            storage: StorageConfig::default(),
            token: TokenConfig::default(),
        }
    }
}

impl OAuthConfig {
    /// Creates a new config instance from environment variables
    pub fn new() -> Result<Self, String> {
        ConfigCrate::builder()
            .add_source(
                config::Environment::with_prefix("OAUTH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e: ConfigError| e.to_string())?
            .try_deserialize()
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OAuthConfig::default();
        assert_eq!(config.port, 8888);
        assert_eq!(config.storage.store, StorageKind::InMemory);
        assert_eq!(config.storage.redis.url, "");
        assert_eq!(config.token.code_ttl, 600);
        assert_eq!(config.token.default_expires_in, 1800);
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("OAUTH_PORT", "9999");
        std::env::set_var("OAUTH_TOKEN__CODE_TTL", "120");

        let config = OAuthConfig::new().unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.token.code_ttl, 120);
        // untouched fields keep their defaults
        assert_eq!(config.storage.store, StorageKind::InMemory);

        std::env::remove_var("OAUTH_PORT");
        std::env::remove_var("OAUTH_TOKEN__CODE_TTL");
    }

    #[test]
    fn test_redis_storage_from_env() {
        std::env::set_var("OAUTH_STORAGE__STORE", "redis");
        std::env::set_var("OAUTH_STORAGE__REDIS__URL", "redis://localhost:6379");

        let config = OAuthConfig::new().unwrap();
        assert_eq!(config.storage.store, StorageKind::Redis);
        assert_eq!(config.storage.redis.url, "redis://localhost:6379");

        std::env::remove_var("OAUTH_STORAGE__STORE");
        std::env::remove_var("OAUTH_STORAGE__REDIS__URL");
    }
}
