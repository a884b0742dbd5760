//! Invalidation of cached entries after writes
//!
//! A listing key embeds its filter params, so one changed expense can make
//! any number of cached views stale. Writes therefore drop whole key
//! families, always scoped to the acting user.

use super::hybrid::HybridCache;
use super::key::{KeyParams, ResourceFamily, build_key, family_prefix};

/// A successful write against the expense API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create,
    /// Bulk create from an uploaded file
    Import,
    Update(String),
    Delete(String),
}

/// Params identifying a single expense in the `expense` family
pub fn expense_params(id: &str) -> KeyParams {
    KeyParams::new().with("id", id)
}

impl HybridCache {
    /// Remove one exact entry from both tiers
    pub fn invalidate_key(&self, family: &ResourceFamily, user_id: &str, params: &KeyParams) {
        let key = build_key(family, user_id, params);
        log::debug!("Invalidating key {}", key);
        self.evict(&key);
    }

    /// Remove every entry of `family` for `user_id`, whatever its params
    pub fn invalidate_family(&self, family: &ResourceFamily, user_id: &str) -> usize {
        let removed = self.evict_family(&family_prefix(family, user_id));
        log::debug!(
            "Invalidated {} entries in family {} for {}",
            removed,
            family,
            user_id
        );
        removed
    }

    /// Apply the invalidation policy for a completed write
    pub fn invalidate_for(&self, mutation: &Mutation, user_id: &str) {
        match mutation {
            Mutation::Create | Mutation::Import => {
                self.invalidate_family(&ResourceFamily::ExpenseList, user_id);
                self.invalidate_family(&ResourceFamily::Expense, user_id);
                self.invalidate_family(&ResourceFamily::Report, user_id);
            }
            Mutation::Update(id) | Mutation::Delete(id) => {
                self.invalidate_key(&ResourceFamily::Expense, user_id, &expense_params(id));
                self.invalidate_family(&ResourceFamily::ExpenseList, user_id);
                self.invalidate_family(&ResourceFamily::Report, user_id);
            }
        }
    }
}
