//! Result caching keyed by compiled SQL plus bindings.
//!
//! Caching is a get-or-compute wrapper, nothing more: a key is derived from
//! the statement and its bindings, a hit short-circuits the executor, a miss
//! stores the computed payload under the session's TTL. Cache behavior is
//! configured per session through [`CacheConfig`]; there is no process-wide
//! toggle.

use crate::error::QueryResult;
use crate::value::Value;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Storage backend boundary for the result cache.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<serde_json::Value>;

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>);

    async fn delete(&self, key: &str);

    async fn has(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }
}

struct MemoryEntry {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

/// In-process cache backend with per-entry expiry.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) => entry.expires_at.is_some_and(|at| at <= Instant::now()),
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Option<Duration>) {
        let entry = MemoryEntry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.lock().await.insert(key.to_string(), entry);
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

/// Per-session cache behavior; passed into the session constructor instead
/// of any global state.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Entry lifetime; `None` means entries never expire.
    pub ttl: Option<Duration>,
}

/// Get-or-compute wrapper used by the result methods.
#[derive(Clone)]
pub struct CacheManager {
    cache: Arc<dyn Cache>,
    ttl: Option<Duration>,
}

impl CacheManager {
    pub fn new(cache: Arc<dyn Cache>, config: CacheConfig) -> Self {
        Self {
            cache,
            ttl: config.ttl,
        }
    }

    /// `qb:<prefix>:<sha256(sql + serialized bindings)>`.
    pub fn make_key(&self, prefix: &str, sql: &str, bindings: &[Value]) -> QueryResult<String> {
        let mut hasher = Sha256::new();
        hasher.update(sql.as_bytes());
        for value in bindings {
            hasher.update(b"|");
            hasher.update(serde_json::to_string(value)?.as_bytes());
        }
        Ok(format!("qb:{}:{:x}", prefix, hasher.finalize()))
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.cache.get(key).await
    }

    pub async fn set(&self, key: &str, value: serde_json::Value) {
        self.cache.set(key, value, self.ttl).await;
    }

    pub async fn has(&self, key: &str) -> bool {
        self.cache.has(key).await
    }

    pub async fn delete(&self, key: &str) {
        self.cache.delete(key).await;
    }
}
