//! Redis-backed history cache.

use std::future::Future;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};

use super::{CacheError, CachedEntry, HistoryCache};

/// Shares one auto-reconnecting connection across all requests. Every
/// command is bounded by `timeout`.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisCache {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout(timeout))??;
        Ok(Self { conn, timeout })
    }

    async fn bounded<T>(&self, fut: impl Future<Output = RedisResult<T>>) -> Result<T, CacheError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))?
            .map_err(CacheError::from)
    }
}

impl HistoryCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<CachedEntry>>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = self.bounded(conn.get(key)).await?;
        raw.map(|s| serde_json::from_str(&s).map_err(CacheError::from))
            .transpose()
    }

    async fn set(
        &self,
        key: &str,
        entries: &[CachedEntry],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(entries)?;
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => {
                self.bounded::<()>(conn.set_ex(key, payload, ttl.as_secs().max(1)))
                    .await
            }
            None => self.bounded::<()>(conn.set(key, payload)).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        self.bounded::<()>(conn.del(key)).await
    }
}
