//! Key-value storage for circuit state.
//!
//! # Responsibilities
//! - Abstract the shared store behind a small async trait
//! - Provide an in-process implementation (tests, single replica)
//! - Provide a Redis implementation (shared across replicas)
//!
//! # Design Decisions
//! - Values are strings; callers own the encoding
//! - `incr` must be atomic in the backing store
//! - Errors are returned, never swallowed; the circuit breaker decides how
//!   to degrade

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

use crate::config::CircuitBreakerConfig;

/// Errors raised by a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the command.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Redis protocol or connection error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored value could not be decoded.
    #[error("corrupt value for '{key}': {value}")]
    Corrupt { key: String, value: String },
}

/// Minimal async key-value interface used by the circuit breaker.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Atomically increment an integer value, creating it at 0 first.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Short backend name for logs and metrics.
    fn name(&self) -> &'static str;
}

/// In-process store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        // The entry guard holds the shard lock for the read-modify-write.
        let mut entry = self
            .inner
            .entry(key.to_string())
            .or_insert_with(|| "0".to_string());
        let current: i64 = entry.parse().map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            value: entry.clone(),
        })?;
        let next = current + 1;
        *entry = next.to_string();
        Ok(next)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .inner
            .iter()
            .filter(|r| r.key().starts_with(prefix))
            .map(|r| r.key().clone())
            .collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Redis-backed store shared by every replica.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the given `redis://` URL.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

/// Connect the shared store named by `redis_url`.
///
/// Returns `None` when no URL is configured or the initial connection fails;
/// the circuit breaker then keeps all state in process.
pub async fn connect_shared_store(config: &CircuitBreakerConfig) -> Option<Arc<dyn KeyValueStore>> {
    let url = config.redis_url.as_deref()?;
    match RedisStore::connect(url).await {
        Ok(store) => {
            tracing::info!(backend = store.name(), "Circuit state store connected");
            Some(Arc::new(store))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Circuit state store unreachable, using local state only");
            None
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, 1i64).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    /// Incremental `SCAN` so a large keyspace never blocks the server.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut iter = conn.scan_match::<_, String>(format!("{}*", prefix)).await?;
        let mut keys = Vec::new();
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
