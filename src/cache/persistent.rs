//! Durable cache tier
//!
//! Each record is stored as JSON text under `vittacash_cache_<key>` and
//! carries the schema version it was written with. Store faults and
//! unreadable records are logged and treated as misses; nothing here returns
//! an error to the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, duration_millis};
use super::store::DurableStore;

/// Namespace prepended to every key written to the durable store
pub const STORE_NAMESPACE: &str = "vittacash_cache_";

/// Current shape of persisted payloads
pub const DEFAULT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedRecord {
    version: u32,
    payload: Value,
    stored_at: i64,
    expires_at: i64,
}

enum RecordState {
    Missing,
    Valid(PersistedRecord),
    Expired,
    /// Unparseable or written by another schema version
    Unusable,
}

/// Persistent key/value cache with per-entry TTL and schema versioning
pub struct PersistentCache {
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    version: u32,
}

impl PersistentCache {
    /// Wrap a store, purging records from other schema versions and expired
    /// records before first use.
    pub fn new(store: Arc<dyn DurableStore>, clock: Arc<dyn Clock>, version: u32) -> Self {
        let cache = Self {
            store,
            clock,
            version,
        };

        let purged = cache.purge_stale_versions();
        if purged > 0 {
            log::info!(
                "Purged {} cache records not matching schema version {}",
                purged,
                version
            );
        }
        cache.sweep_expired();
        cache
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn location(&self) -> Option<std::path::PathBuf> {
        self.store.location()
    }

    fn store_key(key: &str) -> String {
        format!("{STORE_NAMESPACE}{key}")
    }

    fn classify(&self, raw: Option<String>, now: i64) -> RecordState {
        let Some(raw) = raw else {
            return RecordState::Missing;
        };
        match serde_json::from_str::<PersistedRecord>(&raw) {
            Ok(record) if record.version != self.version => RecordState::Unusable,
            Ok(record) if now > record.expires_at => RecordState::Expired,
            Ok(record) => RecordState::Valid(record),
            Err(e) => {
                log::warn!("Corrupted cache record: {}", e);
                RecordState::Unusable
            }
        }
    }

    fn remove_store_key(&self, store_key: &str) {
        if let Err(e) = self.store.remove(store_key) {
            log::warn!("Failed to remove cache record {}: {}", store_key, e);
        }
    }

    fn store_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(STORE_NAMESPACE))
                .collect(),
            Err(e) => {
                log::warn!("Failed to list cache records: {}", e);
                Vec::new()
            }
        }
    }

    /// Store a value with TTL; store failures are logged and ignored
    pub fn set(&self, key: &str, value: &Value, ttl: Duration) {
        let now = self.clock.now_millis();
        let record = PersistedRecord {
            version: self.version,
            payload: value.clone(),
            stored_at: now,
            expires_at: now.saturating_add(duration_millis(ttl)),
        };

        let text = match serde_json::to_string(&record) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Failed to encode cache record {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.store.set(&Self::store_key(key), &text) {
            log::warn!("Failed to write cache record {}: {}", key, e);
        }
    }

    /// Get a valid value; expired, corrupted and stale-version records are evicted
    pub fn get(&self, key: &str) -> Option<Value> {
        let store_key = Self::store_key(key);
        let raw = match self.store.get(&store_key) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to read cache record {}: {}", key, e);
                return None;
            }
        };

        match self.classify(raw, self.clock.now_millis()) {
            RecordState::Valid(record) => Some(record.payload),
            RecordState::Missing => None,
            RecordState::Expired | RecordState::Unusable => {
                self.remove_store_key(&store_key);
                None
            }
        }
    }

    pub fn evict(&self, key: &str) {
        self.remove_store_key(&Self::store_key(key));
    }

    /// Remove every record whose logical key starts with `prefix`
    pub fn evict_family(&self, prefix: &str) -> usize {
        match self.store.remove_prefix(&Self::store_key(prefix)) {
            Ok(removed) => removed,
            Err(e) => {
                log::warn!("Failed to invalidate cache family {}: {}", prefix, e);
                0
            }
        }
    }

    /// Remove every record owned by this cache, leaving foreign keys alone
    pub fn clear(&self) -> usize {
        match self.store.remove_prefix(STORE_NAMESPACE) {
            Ok(removed) => removed,
            Err(e) => {
                log::warn!("Failed to clear persistent cache: {}", e);
                0
            }
        }
    }

    /// Remove expired records as well as any unreadable ones
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut removed = 0;

        for store_key in self.store_keys() {
            let raw = match self.store.get(&store_key) {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Failed to read cache record {}: {}", store_key, e);
                    continue;
                }
            };
            let stale = match self.classify(raw, now) {
                RecordState::Valid(record) => record.expires_at < now,
                RecordState::Missing => false,
                RecordState::Expired | RecordState::Unusable => true,
            };
            if stale {
                self.remove_store_key(&store_key);
                removed += 1;
            }
        }
        removed
    }

    /// Remove records written under a different schema version
    fn purge_stale_versions(&self) -> usize {
        let mut removed = 0;
        for store_key in self.store_keys() {
            let Ok(Some(raw)) = self.store.get(&store_key) else {
                continue;
            };
            let current = serde_json::from_str::<PersistedRecord>(&raw)
                .map(|r| r.version == self.version)
                .unwrap_or(false);
            if !current {
                self.remove_store_key(&store_key);
                removed += 1;
            }
        }
        removed
    }

    pub fn stats(&self) -> PersistentStats {
        let now = self.clock.now_millis();
        let mut stats = PersistentStats::default();

        for store_key in self.store_keys() {
            stats.total_entries += 1;
            match self.store.get(&store_key) {
                Ok(raw) => match self.classify(raw, now) {
                    RecordState::Valid(_) => stats.valid_entries += 1,
                    _ => stats.expired_entries += 1,
                },
                Err(_) => stats.expired_entries += 1,
            }
        }
        stats
    }
}

/// Best-effort snapshot of the persistent tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistentStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    /// Expired, corrupted or stale-version records not yet removed
    pub expired_entries: usize,
}
