//! Expense API client

use async_trait::async_trait;

use crate::error::Result;

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod models;

pub use http::HttpExpenseClient;
#[cfg(test)]
pub use mock::MockExpenseClient;
pub use models::{
    CategoryTotal, Expense, ExpenseFilter, ExpenseInput, ImportRowError, ImportSummary,
    MonthTotal, RecurrenceType, Report, ReportRequest,
};

/// Expense API trait
///
/// Every call is scoped to the account behind the client's credentials.
#[async_trait]
pub trait ExpenseApi: Send + Sync {
    /// List expenses matching the filter, newest first
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>>;

    /// Get a single expense
    async fn get_expense(&self, id: &str) -> Result<Expense>;

    async fn create_expense(&self, input: &ExpenseInput) -> Result<Expense>;

    async fn update_expense(&self, id: &str, input: &ExpenseInput) -> Result<Expense>;

    async fn delete_expense(&self, id: &str) -> Result<()>;

    /// Bulk-create expenses from a CSV file; invalid rows are reported, not fatal
    async fn import_expenses(&self, file_name: &str, csv: &[u8]) -> Result<ImportSummary>;

    /// Monthly totals per category or yearly totals per month
    async fn report(&self, request: &ReportRequest) -> Result<Report>;
}
