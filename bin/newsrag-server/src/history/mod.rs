//! Conversation history: durable message log plus cached projection.
//!
//! Write order is always durable first, cache second, so the cache can lag
//! the durable log but never lead it. After any cache failure on the write
//! path the session's cache key is invalidated, which makes the next read
//! rebuild it from the durable log. Cache failures only fail an operation
//! in [`HistoryStore::create_session`], where the freshly inserted session
//! row is rolled back through a [`Saga`].

pub mod locks;
pub mod saga;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheError, CachedEntry, HistoryCache, session_key};
use crate::entities::{MessageRecord, MessageStore, Role, SessionRecord, SessionStore, now};

pub use locks::SessionLocks;
pub use saga::Saga;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("durable store error: {0}")]
    Durable(#[from] sqlx::Error),

    /// Only produced by session creation.
    #[error("failed to initialize session cache: {0}")]
    Cache(#[source] CacheError),
}

pub struct HistoryStore<S, C> {
    store: Arc<S>,
    cache: Arc<C>,
    ttl: Option<Duration>,
    locks: SessionLocks,
}

impl<S, C> HistoryStore<S, C>
where
    S: SessionStore + MessageStore,
    C: HistoryCache,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, ttl: Option<Duration>, serialize_writes: bool) -> Self {
        Self {
            store,
            cache,
            ttl,
            locks: SessionLocks::new(serialize_writes),
        }
    }

    /// Insert the session row, then seed an empty cached history.
    ///
    /// If seeding fails the row is deleted again and the cache error is
    /// returned, whether or not the delete succeeded.
    pub async fn create_session(&self, token: &str) -> Result<SessionRecord, HistoryError> {
        let mut saga = Saga::new("create_session");

        let session = self.store.create_session(token, now()).await?;
        {
            let store = Arc::clone(&self.store);
            let id = session.id;
            saga.on_rollback("insert session row", move || async move {
                store.delete_session(id).await?;
                Ok(())
            });
        }

        if let Err(e) = self.cache.set(&session_key(token), &[], self.ttl).await {
            warn!(session = %token, error = %e, "session cache init failed; rolling back");
            for failure in saga.abort().await {
                error!(
                    session = %token,
                    step = failure.step,
                    error = %failure.error,
                    "session row left behind after failed rollback"
                );
            }
            return Err(HistoryError::Cache(e));
        }

        saga.commit();
        info!(session = %token, "session created");
        Ok(session)
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub async fn resolve_session(&self, token: &str) -> Result<SessionRecord, HistoryError> {
        self.store
            .find_session(token)
            .await?
            .ok_or_else(|| HistoryError::SessionNotFound(token.to_owned()))
    }

    /// Append one turn.
    pub async fn record_turn(
        &self,
        token: &str,
        role: Role,
        content: &str,
    ) -> Result<MessageRecord, HistoryError> {
        let session = self.resolve_session(token).await?;
        let _guard = self.locks.acquire(token).await;
        self.append(&session, role, content).await
    }

    /// Append the user's query and the bot's answer, in that order, under a
    /// single session lookup.
    pub async fn record_exchange(
        &self,
        token: &str,
        query: &str,
        answer: &str,
    ) -> Result<(MessageRecord, MessageRecord), HistoryError> {
        let session = self.resolve_session(token).await?;
        let _guard = self.locks.acquire(token).await;
        let user = self.append(&session, Role::User, query).await?;
        let bot = self.append(&session, Role::Bot, answer).await?;
        Ok((user, bot))
    }

    /// Cached history when present, otherwise the durable log (which is then
    /// written back to the cache on a best-effort basis).
    pub async fn read_history(&self, token: &str) -> Result<Vec<CachedEntry>, HistoryError> {
        let session = self.resolve_session(token).await?;
        let key = session_key(token);

        match self.cache.get(&key).await {
            Ok(Some(entries)) => return Ok(entries),
            Ok(None) => debug!(session = %token, "history cache miss"),
            Err(e) => warn!(session = %token, error = %e, "history cache read failed; using durable store"),
        }

        let _guard = self.locks.acquire(token).await;
        let entries: Vec<CachedEntry> = self
            .store
            .list_messages(session.id)
            .await?
            .iter()
            .map(CachedEntry::from)
            .collect();
        if let Err(e) = self.cache.set(&key, &entries, self.ttl).await {
            warn!(session = %token, error = %e, "failed to repopulate history cache");
        }
        Ok(entries)
    }

    /// Durable messages of a session, bypassing the cache.
    pub async fn list_messages(&self, token: &str) -> Result<Vec<MessageRecord>, HistoryError> {
        let session = self.resolve_session(token).await?;
        Ok(self.store.list_messages(session.id).await?)
    }

    /// Drop the cached history (best effort), then the messages, then the
    /// session row.
    pub async fn clear_session(&self, token: &str) -> Result<(), HistoryError> {
        let session = self.resolve_session(token).await?;
        let guard = self.locks.acquire(token).await;

        if let Err(e) = self.cache.delete(&session_key(token)).await {
            warn!(session = %token, error = %e, "failed to delete cached history");
        }
        let removed = self.store.delete_messages(session.id).await?;
        self.store.delete_session(session.id).await?;

        drop(guard);
        self.locks.forget(token);
        info!(session = %token, messages = removed, "session cleared");
        Ok(())
    }

    async fn append(
        &self,
        session: &SessionRecord,
        role: Role,
        content: &str,
    ) -> Result<MessageRecord, HistoryError> {
        let message = self.store.append_message(session.id, role, content).await?;
        self.push_to_cache(&session.session_token, &message).await;
        Ok(message)
    }

    async fn push_to_cache(&self, token: &str, message: &MessageRecord) {
        let key = session_key(token);
        match self.cache.get(&key).await {
            Ok(Some(mut entries)) => {
                entries.push(CachedEntry::from(message));
                if let Err(e) = self.cache.set(&key, &entries, self.ttl).await {
                    warn!(session = %token, error = %e, "history cache write failed; invalidating");
                    self.invalidate(&key).await;
                }
            }
            // A partial array would hide older turns; the next read rebuilds it instead.
            Ok(None) => debug!(session = %token, "history not cached; skipping cache append"),
            Err(e) => {
                warn!(session = %token, error = %e, "history cache read failed; invalidating");
                self.invalidate(&key).await;
            }
        }
    }

    async fn invalidate(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!(key, error = %e, "failed to invalidate cached history");
        }
    }
}
