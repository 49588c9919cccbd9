//! History cache.
//!
//! The cache holds, per session, a JSON array of `{role, content, createdAt}`
//! entries under `session:{token}`. It is a projection of the durable message
//! log and may lag behind it; it is never the source of truth.

pub mod memory;
pub mod redis;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::entities::{MessageRecord, Role, format_timestamp};

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

/// Cache key for a session token.
pub fn session_key(token: &str) -> String {
    format!("session:{token}")
}

/// One cached turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEntry {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<&MessageRecord> for CachedEntry {
    fn from(m: &MessageRecord) -> Self {
        Self {
            role: m.role,
            content: m.content.clone(),
            created_at: Some(format_timestamp(m.created_at)),
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("cache call exceeded {0:?}")]
    Timeout(Duration),

    #[error("cached value is not a valid history array: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub trait HistoryCache: Send + Sync + 'static {
    /// `None` on miss or expiry.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Vec<CachedEntry>>, CacheError>> + Send;

    /// Overwrite `key`. `ttl = None` stores without expiry.
    fn set(
        &self,
        key: &str,
        entries: &[CachedEntry],
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), CacheError>> + Send;
}

/// The cache selected at startup.
pub enum CacheBackend {
    Redis(RedisCache),
    Memory(MemoryCache),
}

impl CacheBackend {
    pub fn kind(&self) -> &'static str {
        match self {
            CacheBackend::Redis(_) => "redis",
            CacheBackend::Memory(_) => "memory",
        }
    }

    /// Redis when a URL is configured, the in-process cache otherwise.
    pub async fn connect(url: Option<&str>, timeout: Duration) -> Result<Self, CacheError> {
        match url {
            Some(url) => {
                let cache = RedisCache::connect(url, timeout).await?;
                info!("history cache: redis");
                Ok(CacheBackend::Redis(cache))
            }
            None => {
                info!("history cache: in-process (no redis url configured)");
                Ok(CacheBackend::Memory(MemoryCache::new()))
            }
        }
    }
}

impl HistoryCache for CacheBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<CachedEntry>>, CacheError> {
        match self {
            CacheBackend::Redis(c) => c.get(key).await,
            CacheBackend::Memory(c) => c.get(key).await,
        }
    }

    async fn set(
        &self,
        key: &str,
        entries: &[CachedEntry],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        match self {
            CacheBackend::Redis(c) => c.set(key, entries, ttl).await,
            CacheBackend::Memory(c) => c.set(key, entries, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheBackend::Redis(c) => c.delete(key).await,
            CacheBackend::Memory(c) => c.delete(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_wire_format_is_camel_case() {
        let entry = CachedEntry {
            role: Role::Bot,
            content: "hi".into(),
            created_at: Some("2024-01-01T00:00:00.000000Z".into()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["role"], "bot");
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00.000000Z");
    }

    #[test]
    fn entry_without_timestamp_parses() {
        let entries: Vec<CachedEntry> =
            serde_json::from_str(r#"[{"role":"user","content":"hello"}]"#).unwrap();
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].created_at, None);
    }

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(session_key("abc"), "session:abc");
    }
}
