//! Read-through orchestration over both cache tiers

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::clock::Clock;
use super::key::CacheKey;
use super::persistent::{PersistentCache, PersistentStats};
use super::store::DurableStore;
use super::volatile::{VolatileCache, VolatileStats};
use super::{TierTtl, TtlPolicy};

/// Volatile tier in front of a persistent tier.
///
/// Construct one per application and share it (usually behind an `Arc`)
/// with the data-access layer. Concurrent misses for the same key are not
/// coalesced: each caller fetches and the last write wins.
pub struct HybridCache {
    volatile: VolatileCache,
    persistent: PersistentCache,
    ttl: TtlPolicy,
}

impl HybridCache {
    pub fn new(
        store: Arc<dyn DurableStore>,
        clock: Arc<dyn Clock>,
        schema_version: u32,
        ttl: TtlPolicy,
    ) -> Self {
        Self {
            volatile: VolatileCache::new(clock.clone()),
            persistent: PersistentCache::new(store, clock, schema_version),
            ttl,
        }
    }

    pub fn volatile(&self) -> &VolatileCache {
        &self.volatile
    }

    pub fn persistent(&self) -> &PersistentCache {
        &self.persistent
    }

    pub fn ttl_policy(&self) -> &TtlPolicy {
        &self.ttl
    }

    /// Resolve `key` through volatile, then persistent, then `fetch`.
    ///
    /// A persistent hit is copied into the volatile tier. `fetch` runs at most
    /// once; its error is returned unchanged and nothing is cached. A cached
    /// value that no longer decodes as `T` is evicted and treated as a miss.
    pub async fn resolve<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        fetch: F,
        ttl: TierTtl,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key_str = key.as_str();

        if let Some(value) = self.volatile.get(key_str) {
            match serde_json::from_value::<T>(value) {
                Ok(hit) => {
                    log::debug!("Cache hit (volatile): {}", key);
                    return Ok(hit);
                }
                Err(e) => {
                    log::warn!("Discarding undecodable volatile entry {}: {}", key, e);
                    self.volatile.evict(key_str);
                }
            }
        }

        if let Some(value) = self.persistent.get(key_str) {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(hit) => {
                    log::debug!("Cache hit (persistent): {}", key);
                    self.volatile.set(key_str, value, ttl.volatile);
                    return Ok(hit);
                }
                Err(e) => {
                    log::warn!("Discarding undecodable persistent entry {}: {}", key, e);
                    self.persistent.evict(key_str);
                }
            }
        }

        log::debug!("Cache miss: {}", key);
        let fetched = fetch().await?;

        match serde_json::to_value(&fetched) {
            Ok(value) => {
                self.persistent.set(key_str, &value, ttl.persistent);
                self.volatile.set(key_str, value, ttl.volatile);
            }
            Err(e) => log::warn!("Not caching {}: {}", key, e),
        }

        Ok(fetched)
    }

    /// Look a key up in either tier without promotion or fetching
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        self.volatile
            .get(key.as_str())
            .or_else(|| self.persistent.get(key.as_str()))
    }

    /// Write a value directly into both tiers
    pub fn set(&self, key: &CacheKey, value: Value, ttl: TierTtl) {
        self.persistent.set(key.as_str(), &value, ttl.persistent);
        self.volatile.set(key.as_str(), value, ttl.volatile);
    }

    pub fn evict(&self, key: &CacheKey) {
        self.volatile.evict(key.as_str());
        self.persistent.evict(key.as_str());
    }

    /// Evict every key starting with `prefix` from both tiers
    pub fn evict_family(&self, prefix: &str) -> usize {
        self.volatile.evict_family(prefix) + self.persistent.evict_family(prefix)
    }

    pub fn clear(&self) -> SweepStats {
        SweepStats {
            volatile_removed: self.volatile.clear(),
            persistent_removed: self.persistent.clear(),
        }
    }

    pub fn sweep_expired(&self) -> SweepStats {
        SweepStats {
            volatile_removed: self.volatile.sweep_expired(),
            persistent_removed: self.persistent.sweep_expired(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            volatile: self.volatile.stats(),
            persistent: self.persistent.stats(),
        }
    }
}

/// Entries removed per tier by a sweep or clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub volatile_removed: usize,
    pub persistent_removed: usize,
}

impl SweepStats {
    pub fn total(&self) -> usize {
        self.volatile_removed + self.persistent_removed
    }
}

/// Statistics about both tiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub volatile: VolatileStats,
    pub persistent: PersistentStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheTtl;
    use crate::cache::clock::ManualClock;
    use crate::cache::persistent::DEFAULT_SCHEMA_VERSION;
    use crate::cache::store::MemoryStore;
    use crate::cache::key::{KeyParams, ResourceFamily, build_key};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    struct UpstreamDown;

    fn test_cache() -> (HybridCache, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let cache = HybridCache::new(
            Arc::new(MemoryStore::new()),
            Arc::new(clock.clone()),
            DEFAULT_SCHEMA_VERSION,
            TtlPolicy::default(),
        );
        (cache, clock)
    }

    fn list_key() -> CacheKey {
        build_key(
            &ResourceFamily::ExpenseList,
            "U1",
            &KeyParams::new().with("month", 11).with("year", 2025),
        )
    }

    #[tokio::test]
    async fn test_resolve_fetches_on_miss_and_fills_both_tiers() {
        let (cache, _clock) = test_cache();
        let key = list_key();

        let value: Vec<u32> = cache
            .resolve(
                &key,
                || async { Ok::<_, UpstreamDown>(vec![1, 2, 3]) },
                CacheTtl::EXPENSE_LIST,
            )
            .await
            .unwrap();

        assert_eq!(value, vec![1, 2, 3]);
        assert_eq!(cache.volatile().get(key.as_str()), Some(json!([1, 2, 3])));
        assert_eq!(cache.persistent().get(key.as_str()), Some(json!([1, 2, 3])));
    }

    #[tokio::test]
    async fn test_resolve_serves_from_cache_until_expiry() {
        let (cache, clock) = test_cache();
        let key = list_key();
        let ttl = CacheTtl::EXPENSE_LIST;

        let first: Vec<u32> = cache
            .resolve(&key, || async { Ok::<_, UpstreamDown>(vec![7]) }, ttl)
            .await
            .unwrap();

        // A failing fetch proves the second read never reached upstream
        let second: Vec<u32> = cache
            .resolve(&key, || async { Err(UpstreamDown) }, ttl)
            .await
            .unwrap();
        assert_eq!(first, second);

        clock.advance(ttl.persistent + Duration::from_secs(1));

        let third: Result<Vec<u32>, _> = cache
            .resolve(&key, || async { Err(UpstreamDown) }, ttl)
            .await;
        assert_eq!(third, Err(UpstreamDown));
    }

    #[tokio::test]
    async fn test_persistent_hit_promotes_to_volatile() {
        let (cache, _clock) = test_cache();
        let key = list_key();
        cache
            .persistent()
            .set(key.as_str(), &json!(["from disk"]), Duration::from_secs(600));
        assert!(cache.volatile().get(key.as_str()).is_none());

        let value: Vec<String> = cache
            .resolve(&key, || async { Err(UpstreamDown) }, CacheTtl::EXPENSE_LIST)
            .await
            .unwrap();

        assert_eq!(value, vec!["from disk".to_string()]);
        assert_eq!(cache.volatile().get(key.as_str()), Some(json!(["from disk"])));
    }

    #[tokio::test]
    async fn test_volatile_expiry_falls_back_to_persistent() {
        let (cache, clock) = test_cache();
        let key = list_key();
        let ttl = CacheTtl::EXPENSE_LIST;

        let _: u32 = cache
            .resolve(&key, || async { Ok::<_, UpstreamDown>(5) }, ttl)
            .await
            .unwrap();

        clock.advance(ttl.volatile + Duration::from_secs(1));
        assert!(cache.volatile().get(key.as_str()).is_none());

        let value: u32 = cache
            .resolve(&key, || async { Err(UpstreamDown) }, ttl)
            .await
            .unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let (cache, _clock) = test_cache();
        let key = list_key();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let result: Result<Vec<u32>, _> = cache
            .resolve(
                &key,
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(UpstreamDown)
                },
                CacheTtl::EXPENSE_LIST,
            )
            .await;

        assert_eq!(result, Err(UpstreamDown));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.stats().volatile.total_entries, 0);
        assert_eq!(cache.stats().persistent.total_entries, 0);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_refetched() {
        let (cache, _clock) = test_cache();
        let key = list_key();
        cache.set(&key, json!("not a number"), CacheTtl::EXPENSE_LIST);

        let value: u32 = cache
            .resolve(
                &key,
                || async { Ok::<_, UpstreamDown>(42) },
                CacheTtl::EXPENSE_LIST,
            )
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(cache.get(&key), Some(json!(42)));
    }

    #[tokio::test]
    async fn test_clear_and_sweep_cover_both_tiers() {
        let (cache, clock) = test_cache();
        let ttl = TierTtl::new(Duration::from_secs(10), Duration::from_secs(20));
        cache.set(&CacheKey::from("a"), json!(1), ttl);
        cache.set(&CacheKey::from("b"), json!(2), CacheTtl::REPORT);

        clock.advance(Duration::from_secs(21));
        let swept = cache.sweep_expired();
        assert_eq!(swept.volatile_removed, 1);
        assert_eq!(swept.persistent_removed, 1);

        let cleared = cache.clear();
        assert_eq!(cleared.total(), 2);
        assert!(cache.get(&CacheKey::from("b")).is_none());
    }
}
