/// Process-local cache with per-entry expiry
///
/// Expiry is evaluated against the injected clock. Expired entries are dropped
/// when read, and in bulk by `purge_expired`.
use super::KeyValueCache;
use crate::clock::{add_duration, SharedClock};
use crate::errors::CacheError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

struct CacheEntry {
    value: Vec<u8>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct MemoryCache {
    clock: SharedClock,
    data: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining lifetime of a live entry
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        let data = self.data.lock();
        data.get(key)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| (entry.expires_at - now).to_std().ok())
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.clock.now();
        let mut data = self.data.lock();

        match data.get(key) {
            Some(entry) if entry.is_expired(now) => {
                data.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = add_duration(self.clock.now(), ttl);

        self.data
            .lock()
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.data.lock().remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = self.clock.now();
        let mut data = self.data.lock();
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired(now));
        Ok(before - data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn cache() -> (MemoryCache, ManualClock) {
        let clock = ManualClock::default();
        (MemoryCache::new(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let (cache, clock) = cache();
        cache
            .set("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn purge_drops_unread_expired_entries() {
        let (cache, clock) = cache();
        cache
            .set("short", b"a".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set("long", b"b".to_vec(), Duration::from_secs(3600))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(61));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long").await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(cache.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn overwrite_replaces_value_and_expiry() {
        let (cache, clock) = cache();
        cache
            .set("k", b"old".to_vec(), Duration::from_secs(10))
            .await
            .unwrap();
        cache
            .set("k", b"new".to_vec(), Duration::from_secs(3600))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(30));
        assert_eq!(cache.get("k").await.unwrap(), Some(b"new".to_vec()));
        assert_eq!(cache.ttl_of("k"), Some(Duration::from_secs(3570)));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let (cache, _clock) = cache();
        cache
            .set("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
