use serde::Deserialize;

/// Specifies which storage backend to use
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StorageKind {
    /// Process-local storage; data does not survive a restart
    #[default]
    InMemory,
    Redis,
}

/// Configuration for the persistence subsystem
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Storage backend: "in-memory" (default) or "redis"
    #[serde(default)]
    pub store: StorageKind,

    /// Redis specific configuration
    #[serde(default)]
    pub redis: RedisStorageConfig,
}

/// Redis storage configuration options
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisStorageConfig {
    /// Redis connection string
    #[serde(default)]
    pub url: String,
}
