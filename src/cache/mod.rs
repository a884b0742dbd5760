//! Two-tier client cache for expense API responses
//!
//! A volatile in-process tier sits in front of a persistent tier backed by a
//! [`DurableStore`]. Reads go through [`HybridCache::resolve`]; writes
//! invalidate affected key families for the acting user.

pub mod client;
pub mod clock;
pub mod hybrid;
pub mod invalidation;
pub mod key;
pub mod persistent;
pub mod store;
pub mod sweeper;
pub mod volatile;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheSettings;

/// TTLs for one entry in each tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTtl {
    #[serde(rename = "volatile_secs", with = "secs")]
    pub volatile: Duration,
    #[serde(rename = "persistent_secs", with = "secs")]
    pub persistent: Duration,
}

impl TierTtl {
    pub const fn new(volatile: Duration, persistent: Duration) -> Self {
        Self {
            volatile,
            persistent,
        }
    }
}

/// Default TTLs per resource family
pub struct CacheTtl;

impl CacheTtl {
    // Listings change whenever any expense changes
    pub const EXPENSE_LIST: TierTtl = TierTtl::new(
        Duration::from_secs(3 * 60),  // 3 min
        Duration::from_secs(10 * 60), // 10 min
    );

    pub const EXPENSE: TierTtl = TierTtl::new(
        Duration::from_secs(3 * 60),  // 3 min
        Duration::from_secs(15 * 60), // 15 min
    );

    // Aggregates are expensive server-side
    pub const REPORT: TierTtl = TierTtl::new(
        Duration::from_secs(5 * 60),  // 5 min
        Duration::from_secs(20 * 60), // 20 min
    );
}

/// TTLs applied per family, overridable from config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlPolicy {
    #[serde(default = "default_expense_list_ttl")]
    pub expense_list: TierTtl,
    #[serde(default = "default_expense_ttl")]
    pub expense: TierTtl,
    #[serde(default = "default_report_ttl")]
    pub report: TierTtl,
}

fn default_expense_list_ttl() -> TierTtl {
    CacheTtl::EXPENSE_LIST
}

fn default_expense_ttl() -> TierTtl {
    CacheTtl::EXPENSE
}

fn default_report_ttl() -> TierTtl {
    CacheTtl::REPORT
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            expense_list: CacheTtl::EXPENSE_LIST,
            expense: CacheTtl::EXPENSE,
            report: CacheTtl::REPORT,
        }
    }
}

impl TtlPolicy {
    pub fn for_family(&self, family: &ResourceFamily) -> TierTtl {
        match family {
            ResourceFamily::ExpenseList => self.expense_list,
            ResourceFamily::Expense => self.expense,
            ResourceFamily::Report => self.report,
            ResourceFamily::Other(_) => self.expense_list,
        }
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// Build the cache described by `settings`.
///
/// A durable store that cannot be opened degrades to an in-memory store so
/// the application keeps working without persistence.
pub fn open(settings: &CacheSettings) -> HybridCache {
    let store: Arc<dyn DurableStore> = if !settings.enabled {
        Arc::new(NullStore)
    } else {
        let opened = match settings.dir.as_deref() {
            Some(dir) => SqliteStore::open_at(dir, settings.quota_bytes),
            None => SqliteStore::open(settings.quota_bytes),
        };
        match opened {
            Ok(store) => Arc::new(store),
            Err(e) => {
                log::warn!("Persistent cache unavailable, using memory only: {}", e);
                Arc::new(MemoryStore::new())
            }
        }
    };

    HybridCache::new(
        store,
        Arc::new(SystemClock),
        settings.schema_version,
        settings.ttl,
    )
}

// Re-export main types
pub use client::CachedExpenseClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use hybrid::{CacheStats, HybridCache, SweepStats};
pub use invalidation::Mutation;
pub use key::{
    ANONYMOUS_USER, CacheKey, KeyParams, ResourceFamily, build_key, family_prefix, user_scope,
};
pub use persistent::{DEFAULT_SCHEMA_VERSION, PersistentCache, PersistentStats};
pub use store::{DurableStore, MemoryStore, NullStore, SqliteStore};
pub use sweeper::{SweepIntervals, Sweeper};
pub use volatile::{VolatileCache, VolatileStats};
