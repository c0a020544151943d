/// Key-value cache capability used by the acquisition layer
///
/// The cache is consumed only through `get`/`set`/`delete`; there is no
/// compare-and-swap, so read-modify-write sequences (activity baselines) may
/// race under concurrent refreshes of the same key. A store offering atomic
/// updates can be substituted here without touching policy code.
///
/// - `memory`: process-local store, expiry evaluated against a `Clock`
/// - `sqlite`: durable store, survives restarts
/// - `keys`: deterministic key builders
use crate::errors::CacheError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod keys;
pub mod memory;
pub mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Returns `None` for missing or expired keys
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Replaces value and expiry together
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every expired entry, returning how many were removed
    async fn purge_expired(&self) -> Result<usize, CacheError>;
}

pub type SharedCache = Arc<dyn KeyValueCache>;

pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn KeyValueCache,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn KeyValueCache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec(value)?;
    cache.set(key, bytes, ttl).await
}

/// Read a JSON entry, logging failures and treating them as a miss
pub async fn read_or_miss<T: DeserializeOwned>(
    cache: &dyn KeyValueCache,
    key: &str,
    tag: LogTag,
) -> Option<T> {
    match get_json(cache, key).await {
        Ok(value) => value,
        Err(e) => {
            logger::warning(tag, &format!("Cache read failed key={} error={}", key, e));
            None
        }
    }
}

/// Write a JSON entry, logging failures without propagating them
pub async fn write_logged<T: Serialize + ?Sized>(
    cache: &dyn KeyValueCache,
    key: &str,
    value: &T,
    ttl: Duration,
    tag: LogTag,
) {
    match set_json(cache, key, value, ttl).await {
        Ok(()) => logger::debug(
            tag,
            &format!("Cached key={} ttl={}s", key, ttl.as_secs()),
        ),
        Err(e) => logger::warning(tag, &format!("Cache write failed key={} error={}", key, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::collections::HashMap;

    #[tokio::test]
    async fn json_helpers_round_trip_through_bytes() {
        let cache = MemoryCache::new(Arc::new(ManualClock::default()));
        let mut xp = HashMap::new();
        xp.insert("Attack".to_string(), 1_000_i64);

        set_json(&cache, "osrs:last_xp:zezima", &xp, Duration::from_secs(60))
            .await
            .unwrap();
        let loaded: Option<HashMap<String, i64>> = get_json(&cache, "osrs:last_xp:zezima")
            .await
            .unwrap();

        assert_eq!(loaded, Some(xp));
    }

    #[tokio::test]
    async fn corrupt_entries_are_read_as_a_miss() {
        let cache = MemoryCache::new(Arc::new(ManualClock::default()));
        cache
            .set("steam:owned_games:1", b"not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(get_json::<Vec<u32>>(&cache, "steam:owned_games:1").await.is_err());
        let lenient: Option<Vec<u32>> =
            read_or_miss(&cache, "steam:owned_games:1", LogTag::Test).await;
        assert!(lenient.is_none());
    }
}
