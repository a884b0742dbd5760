//! Cached wrapper for the expense API client
//!
//! Reads resolve through the hybrid cache; writes go to the API and then
//! invalidate the acting user's affected key families before returning.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::sync::Arc;

use crate::cache::invalidation::expense_params;
use crate::cache::{HybridCache, KeyParams, Mutation, ResourceFamily, build_key, user_scope};
use crate::client::{
    Expense, ExpenseApi, ExpenseFilter, ExpenseInput, ImportSummary, Report, ReportRequest,
};
use crate::error::Result;

/// Cached wrapper for any ExpenseApi implementation.
///
/// With `refresh` set (for `--no-cache`), reads skip cached entries but still
/// store what they fetch, so later runs see the fresh data.
pub struct CachedExpenseClient<C: ExpenseApi> {
    inner: Arc<C>,
    cache: Arc<HybridCache>,
    user_id: String,
    refresh: bool,
}

impl<C: ExpenseApi> CachedExpenseClient<C> {
    /// Create a new cached client wrapper.
    ///
    /// # Arguments
    /// * `inner` - The underlying API client to wrap
    /// * `cache` - Shared cache instance
    /// * `user_id` - Account the cached entries belong to (`None` for anonymous)
    pub fn new(inner: C, cache: Arc<HybridCache>, user_id: Option<&str>) -> Self {
        Self {
            inner: Arc::new(inner),
            cache,
            user_id: user_scope(user_id).to_string(),
            refresh: false,
        }
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Get the inner client
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn cache(&self) -> &Arc<HybridCache> {
        &self.cache
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn read_through<T, F, Fut>(
        &self,
        family: ResourceFamily,
        params: KeyParams,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = build_key(&family, &self.user_id, &params);
        if self.refresh {
            self.cache.evict(&key);
        }
        let ttl = self.cache.ttl_policy().for_family(&family);
        self.cache.resolve(&key, fetch, ttl).await
    }
}

#[async_trait]
impl<C: ExpenseApi + 'static> ExpenseApi for CachedExpenseClient<C> {
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        self.read_through(ResourceFamily::ExpenseList, filter.key_params(), || {
            self.inner.list_expenses(filter)
        })
        .await
    }

    async fn get_expense(&self, id: &str) -> Result<Expense> {
        self.read_through(ResourceFamily::Expense, expense_params(id), || {
            self.inner.get_expense(id)
        })
        .await
    }

    async fn create_expense(&self, input: &ExpenseInput) -> Result<Expense> {
        let created = self.inner.create_expense(input).await?;
        self.cache.invalidate_for(&Mutation::Create, &self.user_id);
        Ok(created)
    }

    async fn update_expense(&self, id: &str, input: &ExpenseInput) -> Result<Expense> {
        let updated = self.inner.update_expense(id, input).await?;
        self.cache.invalidate_for(&Mutation::Update(id.to_string()), &self.user_id);
        Ok(updated)
    }

    async fn delete_expense(&self, id: &str) -> Result<()> {
        self.inner.delete_expense(id).await?;
        self.cache.invalidate_for(&Mutation::Delete(id.to_string()), &self.user_id);
        Ok(())
    }

    async fn import_expenses(&self, file_name: &str, csv: &[u8]) -> Result<ImportSummary> {
        let summary = self.inner.import_expenses(file_name, csv).await?;
        // Rejected rows are reported in the summary; the valid ones were stored
        self.cache.invalidate_for(&Mutation::Import, &self.user_id);
        Ok(summary)
    }

    async fn report(&self, request: &ReportRequest) -> Result<Report> {
        self.read_through(ResourceFamily::Report, request.key_params(), || {
            self.inner.report(request)
        })
        .await
    }
}
