//! Process-local history cache with per-key expiry.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::{CacheError, CachedEntry, HistoryCache};

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Vec<CachedEntry>, Option<Instant>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl HistoryCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<CachedEntry>>, CacheError> {
        let mut map = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = match map.get(key) {
            None => return Ok(None),
            Some((_, Some(deadline))) => *deadline <= Instant::now(),
            Some((_, None)) => false,
        };
        if expired {
            map.remove(key);
            return Ok(None);
        }
        Ok(map.get(key).map(|(entries, _)| entries.clone()))
    }

    async fn set(
        &self,
        key: &str,
        entries: &[CachedEntry],
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut map = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        // Expired keys that are never read again would otherwise stay forever.
        map.retain(|_, (_, deadline)| deadline.is_none_or(|d| d > now));
        map.insert(key.to_owned(), (entries.to_vec(), ttl.map(|ttl| now + ttl)));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
