//! Durable key/value stores behind the persistent cache tier
//!
//! [`SqliteStore`] keeps records in a SQLite file under the XDG cache
//! directory. [`MemoryStore`] and [`NullStore`] stand in where no durable
//! storage is available (tests, `--no-cache`).

use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::StoreError;

/// Schema version of the SQLite table layout - increment to trigger nuke-and-rebuild
const STORE_SCHEMA_VERSION: i32 = 1;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Minimal durable storage capability used by the persistent cache
pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    fn remove(&self, key: &str) -> StoreResult<()>;

    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Remove every key starting with `prefix`, returning how many were removed
    fn remove_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let mut removed = 0;
        for key in self.keys()? {
            if key.starts_with(prefix) {
                self.remove(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Where the data lives, for diagnostics
    fn location(&self) -> Option<PathBuf> {
        None
    }
}

/// SQLite-backed durable store
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    quota_bytes: Option<u64>,
}

impl SqliteStore {
    /// Open or create the store at the default XDG cache location
    pub fn open(quota_bytes: Option<u64>) -> StoreResult<Self> {
        let cache_dir = Self::cache_dir()?;
        Self::open_at(&cache_dir, quota_bytes)
    }

    /// Get the cache directory path (~/.cache/vittacash on Linux)
    pub fn cache_dir() -> StoreResult<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(StoreError::NoCacheDir)?;
        Ok(cache_base.join("vittacash"))
    }

    /// Open the store in a specific directory
    pub fn open_at(cache_dir: &Path, quota_bytes: Option<u64>) -> StoreResult<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| StoreError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("cache.db");
        let conn = Connection::open(&db_path)?;

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != STORE_SCHEMA_VERSION {
            log::info!(
                "Cache store schema version mismatch ({} != {}), rebuilding",
                version,
                STORE_SCHEMA_VERSION
            );
            drop(conn);
            std::fs::remove_file(&db_path)
                .map_err(|e| StoreError::Io(format!("Failed to remove cache DB: {}", e)))?;
            return Self::open_at(cache_dir, quota_bytes);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_records (
                store_key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                size_bytes INTEGER NOT NULL
            );
            "#,
        )?;

        conn.pragma_update(None, "user_version", STORE_SCHEMA_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            quota_bytes,
        })
    }

    fn conn(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Unavailable)
    }

    /// Total bytes held, used for quota checks and diagnostics
    pub fn size_bytes(&self) -> StoreResult<u64> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM cache_records",
            [],
            |r| r.get(0),
        )?;
        Ok(total.max(0) as u64)
    }
}

impl DurableStore for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM cache_records WHERE store_key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn()?;

        if let Some(quota) = self.quota_bytes {
            let others: i64 = conn.query_row(
                "SELECT COALESCE(SUM(size_bytes), 0) FROM cache_records WHERE store_key != ?1",
                [key],
                |r| r.get(0),
            )?;
            let used = others.max(0) as u64 + value.len() as u64;
            if used > quota {
                return Err(StoreError::QuotaExceeded { used, quota });
            }
        }

        conn.execute(
            "INSERT OR REPLACE INTO cache_records (store_key, value, size_bytes)
             VALUES (?1, ?2, ?3)",
            params![key, value, value.len() as i64],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM cache_records WHERE store_key = ?1", [key])?;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT store_key FROM cache_records")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn remove_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM cache_records WHERE substr(store_key, 1, ?1) = ?2",
            params![prefix.chars().count() as i64, prefix],
        )?;
        Ok(deleted)
    }

    fn location(&self) -> Option<PathBuf> {
        Some(self.db_path.clone())
    }
}

/// Non-durable store holding records in memory.
///
/// Can be switched offline and given a byte quota to reproduce the failure
/// modes of a real durable store.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, String>>,
    offline: AtomicBool,
    quota_bytes: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Make every subsequent operation fail with `StoreError::Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn records(&self) -> StoreResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        self.records.lock().map_err(|_| StoreError::Unavailable)
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.records()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut records = self.records()?;

        if let Some(quota) = self.quota_bytes {
            let others: usize = records
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let used = (others + value.len()) as u64;
            if used > quota {
                return Err(StoreError::QuotaExceeded { used, quota });
            }
        }

        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.records()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.records()?.keys().cloned().collect())
    }
}

/// Store that keeps nothing; used when persistence is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl DurableStore for NullStore {
    fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> StoreResult<()> {
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(Vec::new())
    }
}
