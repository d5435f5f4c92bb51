use super::{StorageBackend, StorageError};
use crate::models::{AccessToken, AuthorizationCode, ClientApplication, Scope};
use async_trait::async_trait;
use log::error;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};

const CLIENT_PREFIX: &str = "oauth:client:";
const CLIENT_INDEX: &str = "oauth:clients";
const SCOPE_PREFIX: &str = "oauth:scope:";
const SCOPE_INDEX: &str = "oauth:scopes";
const CODE_PREFIX: &str = "oauth:code:";
const TOKEN_PREFIX: &str = "oauth:token:";
const REFRESH_PREFIX: &str = "oauth:refresh:";

/// Grace period added to the Redis TTL hint on authorization codes, so the
/// engine's lazy expiry check stays authoritative near the boundary.
const CODE_TTL_GRACE_SECS: u64 = 60;

/// Conditionally flips a token record's `valid` field in a single server-side
/// step. Returns -1 when the key is unknown, 0 when already invalid, 1 when
/// this call flipped it.
const INVALIDATE_TOKEN_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return -1
end
local record = cjson.decode(raw)
if record.valid == false then
  return 0
end
record.valid = false
redis.call('SET', KEYS[1], cjson.encode(record))
return 1
"#;

#[derive(Clone)]
pub struct RedisStorage {
    _client: Client,
    conn_manager: ConnectionManager,
}

impl RedisStorage {
    /// Initialize a new Redis storage instance
    pub async fn new(redis_url: &str) -> Result<Self, String> {
        let client = match Client::open(redis_url) {
            Ok(client) => client,
            Err(err) => {
                return Err(format!("Failed to connect to Redis: {}", err));
            }
        };

        let conn_manager = match ConnectionManager::new(client.clone()).await {
            Ok(manager) => manager,
            Err(err) => {
                return Err(format!("Failed to create Redis connection manager: {}", err));
            }
        };

        // Test the connection to ensure it's working
        let mut conn = conn_manager.clone();
        if let Err(err) = redis::cmd("PING").query_async::<String>(&mut conn).await {
            return Err(format!("Failed to ping Redis: {}", err));
        }

        Ok(Self {
            conn_manager,
            _client: client,
        })
    }

    async fn put_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.conn_manager.clone();
        match conn.set::<_, _, ()>(key, serialized).await {
            Ok(_) => Ok(()),
            Err(err) => {
                error!("Redis error while setting key {}: {}", key, err);
                Err(StorageError::Redis(err.to_string()))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let mut conn = self.conn_manager.clone();
        let raw: Option<String> = match conn.get(key).await {
            Ok(value) => value,
            Err(err) => {
                error!("Redis error while getting key {}: {}", key, err);
                return Err(StorageError::Redis(err.to_string()));
            }
        };
        Self::parse_json(raw)
    }

    /// GETDEL: the atomic take behind single-use codes and refresh rotation.
    async fn take_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let mut conn = self.conn_manager.clone();
        let raw: Option<String> = match conn.get_del(key).await {
            Ok(value) => value,
            Err(err) => {
                error!("Redis error while taking key {}: {}", key, err);
                return Err(StorageError::Redis(err.to_string()));
            }
        };
        Self::parse_json(raw)
    }

    fn parse_json<T: DeserializeOwned>(raw: Option<String>) -> Result<Option<T>, StorageError> {
        if let Some(value) = raw {
            serde_json::from_str(&value)
                .map_err(|e| StorageError::Deserialization(e.to_string()))
                .map(Some)
        } else {
            Ok(None)
        }
    }

    async fn all_indexed<T: DeserializeOwned>(
        &self,
        index: &str,
        prefix: &str,
    ) -> Result<Vec<T>, StorageError> {
        let mut conn = self.conn_manager.clone();
        let keys: Vec<String> = match conn.smembers(index).await {
            Ok(keys) => keys,
            Err(err) => {
                error!("Redis error while reading index {}: {}", index, err);
                return Err(StorageError::Redis(err.to_string()));
            }
        };

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(record) = self.get_json(&format!("{}{}", prefix, key)).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl StorageBackend for RedisStorage {
    async fn put_client(&self, client: &ClientApplication) -> Result<(), StorageError> {
        self.put_json(&format!("{}{}", CLIENT_PREFIX, client.client_id), client)
            .await?;
        let mut conn = self.conn_manager.clone();
        conn.sadd::<_, _, ()>(CLIENT_INDEX, &client.client_id)
            .await
            .map_err(|err| StorageError::Redis(err.to_string()))
    }

    async fn get_client(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientApplication>, StorageError> {
        self.get_json(&format!("{}{}", CLIENT_PREFIX, client_id)).await
    }

    async fn all_clients(&self) -> Result<Vec<ClientApplication>, StorageError> {
        self.all_indexed(CLIENT_INDEX, CLIENT_PREFIX).await
    }

    async fn insert_scope(&self, scope: &Scope) -> Result<bool, StorageError> {
        let serialized = serde_json::to_string(scope)?;
        let mut conn = self.conn_manager.clone();
        let inserted: bool = conn
            .set_nx(format!("{}{}", SCOPE_PREFIX, scope.name), serialized)
            .await
            .map_err(|err| StorageError::Redis(err.to_string()))?;
        if inserted {
            conn.sadd::<_, _, ()>(SCOPE_INDEX, &scope.name)
                .await
                .map_err(|err| StorageError::Redis(err.to_string()))?;
        }
        Ok(inserted)
    }

    async fn put_scope(&self, scope: &Scope) -> Result<(), StorageError> {
        self.put_json(&format!("{}{}", SCOPE_PREFIX, scope.name), scope)
            .await?;
        let mut conn = self.conn_manager.clone();
        conn.sadd::<_, _, ()>(SCOPE_INDEX, &scope.name)
            .await
            .map_err(|err| StorageError::Redis(err.to_string()))
    }

    async fn get_scope(&self, name: &str) -> Result<Option<Scope>, StorageError> {
        self.get_json(&format!("{}{}", SCOPE_PREFIX, name)).await
    }

    async fn all_scopes(&self) -> Result<Vec<Scope>, StorageError> {
        self.all_indexed(SCOPE_INDEX, SCOPE_PREFIX).await
    }

    async fn delete_scope(&self, name: &str) -> Result<bool, StorageError> {
        let mut conn = self.conn_manager.clone();
        let deleted: i64 = conn
            .del(format!("{}{}", SCOPE_PREFIX, name))
            .await
            .map_err(|err| StorageError::Redis(err.to_string()))?;
        conn.srem::<_, _, ()>(SCOPE_INDEX, name)
            .await
            .map_err(|err| StorageError::Redis(err.to_string()))?;
        Ok(deleted > 0)
    }

    async fn put_code(&self, code: &AuthorizationCode) -> Result<(), StorageError> {
        // Codes are short-lived, so let Redis garbage-collect them; the
        // engine still checks expiry itself.
        let serialized = serde_json::to_string(code)?;
        let mut conn = self.conn_manager.clone();
        conn.set_ex::<_, _, ()>(
            format!("{}{}", CODE_PREFIX, code.code),
            serialized,
            code.expires_in + CODE_TTL_GRACE_SECS,
        )
        .await
        .map_err(|err| {
            error!("Redis error while storing authorization code: {}", err);
            StorageError::Redis(err.to_string())
        })
    }

    async fn take_code(&self, code: &str) -> Result<Option<AuthorizationCode>, StorageError> {
        self.take_json(&format!("{}{}", CODE_PREFIX, code)).await
    }

    async fn put_token(&self, token: &AccessToken) -> Result<(), StorageError> {
        self.put_json(&format!("{}{}", TOKEN_PREFIX, token.token), token)
            .await
    }

    async fn get_token(&self, token: &str) -> Result<Option<AccessToken>, StorageError> {
        self.get_json(&format!("{}{}", TOKEN_PREFIX, token)).await
    }

    async fn invalidate_token(&self, token: &str) -> Result<Option<bool>, StorageError> {
        let script = redis::Script::new(INVALIDATE_TOKEN_SCRIPT);
        let mut conn = self.conn_manager.clone();
        let outcome: i64 = script
            .key(format!("{}{}", TOKEN_PREFIX, token))
            .invoke_async(&mut conn)
            .await
            .map_err(|err| {
                error!("Redis error while invalidating token: {}", err);
                StorageError::Redis(err.to_string())
            })?;
        Ok(match outcome {
            -1 => None,
            0 => Some(false),
            _ => Some(true),
        })
    }

    async fn put_refresh(
        &self,
        refresh_token: &str,
        access_token: &str,
    ) -> Result<(), StorageError> {
        let mut conn = self.conn_manager.clone();
        conn.set::<_, _, ()>(format!("{}{}", REFRESH_PREFIX, refresh_token), access_token)
            .await
            .map_err(|err| StorageError::Redis(err.to_string()))
    }

    async fn take_refresh(&self, refresh_token: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn_manager.clone();
        conn.get_del(format!("{}{}", REFRESH_PREFIX, refresh_token))
            .await
            .map_err(|err| {
                error!("Redis error while taking refresh token: {}", err);
                StorageError::Redis(err.to_string())
            })
    }

    async fn health_check(&self) -> Result<(), String> {
        let mut conn = self.conn_manager.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => Ok(()),
            Err(err) => Err(format!("Redis health check failed: {}", err)),
        }
    }
}
