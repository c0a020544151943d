/// Durable cache backed by SQLite
///
/// One row per key with an absolute expiry in unix milliseconds. Rows are
/// written with `INSERT OR REPLACE`, so an overwrite swaps value and expiry
/// in a single statement. Expired rows are filtered on read and removed by
/// `purge_expired`.
use super::KeyValueCache;
use crate::clock::{add_duration, SharedClock};
use crate::errors::CacheError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    expires_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at ON cache_entries(expires_at);";

#[derive(Clone)]
pub struct SqliteCache {
    db: Arc<Mutex<Connection>>,
    clock: SharedClock,
}

impl SqliteCache {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open<P: AsRef<Path>>(path: P, clock: SharedClock) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Connection::open(path)?;
        db.execute_batch(SCHEMA)?;

        logger::info(
            LogTag::Cache,
            &format!("Opened SQLite cache path={}", path.display()),
        );

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            clock,
        })
    }

    async fn run<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.lock();
            f(&conn)
        })
        .await
        .map_err(|e| CacheError::Task(e.to_string()))?
        .map_err(CacheError::from)
    }
}

#[async_trait]
impl KeyValueCache for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let key = key.to_string();
        let now_ms = self.clock.now().timestamp_millis();
        self.run(move |db| {
            db.query_row(
                "SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
                params![key, now_ms],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let key = key.to_string();
        let expires_at = add_duration(self.clock.now(), ttl).timestamp_millis();
        self.run(move |db| {
            db.execute(
                "INSERT OR REPLACE INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)",
                params![key, value, expires_at],
            )
            .map(|_| ())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let key = key.to_string();
        self.run(move |db| {
            db.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
                .map(|_| ())
        })
        .await
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now_ms = self.clock.now().timestamp_millis();
        self.run(move |db| {
            db.execute(
                "DELETE FROM cache_entries WHERE expires_at <= ?1",
                params![now_ms],
            )
        })
        .await
    }
}
