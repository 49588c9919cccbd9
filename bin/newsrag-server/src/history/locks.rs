//! Optional per-session write serialization.
//!
//! Without it two concurrent turns on the same session can both read the
//! cached array, append, and write back, so the later write drops the
//! earlier turn from the cache (the durable log keeps both).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct SessionLocks {
    enabled: bool,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: Mutex::default(),
        }
    }

    /// Wait for exclusive access to `token`. Returns `None` when disabled.
    pub async fn acquire(&self, token: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }
        let lock = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(token.to_owned())
            .or_default()
            .clone();
        Some(lock.lock_owned().await)
    }

    /// Drop the lock entry of a cleared session if nobody holds it.
    pub fn forget(&self, token: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(token).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(token);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn disabled_locks_never_block() {
        let locks = SessionLocks::new(false);
        assert!(locks.acquire("t").await.is_none());
        assert!(locks.acquire("t").await.is_none());
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn same_token_is_exclusive() {
        let locks = Arc::new(SessionLocks::new(true));
        let guard = locks.acquire("t").await;
        assert!(guard.is_some());

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire("t").await.is_some() })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        assert!(contender.await.unwrap());
    }

    #[tokio::test]
    async fn other_tokens_do_not_contend() {
        let locks = SessionLocks::new(true);
        let _a = locks.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn forget_keeps_held_locks() {
        let locks = SessionLocks::new(true);
        let guard = locks.acquire("t").await;
        locks.forget("t");
        assert_eq!(locks.tracked(), 1);
        drop(guard);
        locks.forget("t");
        assert_eq!(locks.tracked(), 0);
    }
}
