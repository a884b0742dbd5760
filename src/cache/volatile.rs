//! In-process cache tier
//!
//! Entries carry an absolute expiry and are lost when the process exits.
//! There is no capacity bound; memory is reclaimed by lazy eviction on read
//! and by [`VolatileCache::sweep_expired`].

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::clock::{Clock, duration_millis};

#[derive(Debug, Clone)]
struct VolatileEntry {
    value: Value,
    expires_at: i64,
}

/// Memory-only key/value store with per-entry TTL
pub struct VolatileCache {
    entries: Mutex<HashMap<String, VolatileEntry>>,
    clock: Arc<dyn Clock>,
}

impl VolatileCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    // A panic while holding the lock leaves the map consistent, so poisoning is ignored.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, VolatileEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a value, replacing any existing entry for `key`
    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        let expires_at = self
            .clock
            .now_millis()
            .saturating_add(duration_millis(ttl));
        self.entries()
            .insert(key.to_string(), VolatileEntry { value, expires_at });
    }

    /// Return the value if still valid; an expired entry is evicted and reported as a miss
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_millis();
        let mut entries = self.entries();

        match entries.get(key) {
            Some(entry) if now <= entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn evict(&self, key: &str) -> bool {
        self.entries().remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`
    pub fn evict_family(&self, prefix: &str) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries();
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Drop every entry that has already expired, independent of reads
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at >= now);
        before - entries.len()
    }

    /// Entry count, including entries that expired but were not yet swept
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    pub fn stats(&self) -> VolatileStats {
        let now = self.clock.now_millis();
        let entries = self.entries();
        let valid = entries.values().filter(|e| now <= e.expires_at).count();
        VolatileStats {
            total_entries: entries.len(),
            valid_entries: valid,
            expired_entries: entries.len() - valid,
        }
    }
}

/// Best-effort snapshot of the volatile tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolatileStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}
