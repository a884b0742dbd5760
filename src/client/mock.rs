//! Mock expense API client for testing
//!
//! Keeps expenses in memory and answers like the real API, so cache tests
//! can observe stale versus fresh data after writes.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::ExpenseApi;
use super::models::{
    CategoryTotal, Expense, ExpenseFilter, ExpenseInput, ImportRowError, ImportSummary,
    MonthTotal, RecurrenceType, Report, ReportRequest,
};
use crate::error::{ApiError, Result};

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockExpenseClient::new().with_expenses(vec![expense]).await;
/// let listed = mock.list_expenses(&ExpenseFilter::default()).await?;
/// assert_eq!(listed.len(), 1);
/// ```
#[derive(Default)]
pub struct MockExpenseClient {
    expenses: Arc<Mutex<Vec<Expense>>>,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    call_count: Arc<Mutex<CallCounts>>,
    next_id: Arc<Mutex<u64>>,
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub list_expenses: usize,
    pub get_expense: usize,
    pub create_expense: usize,
    pub update_expense: usize,
    pub delete_expense: usize,
    pub import_expenses: usize,
    pub report: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.list_expenses
            + self.get_expense
            + self.create_expense
            + self.update_expense
            + self.delete_expense
            + self.import_expenses
            + self.report
    }
}

impl MockExpenseClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the mock backend
    pub async fn with_expenses(self, expenses: Vec<Expense>) -> Self {
        *self.expenses.lock().await = expenses;
        self
    }

    /// Configure an error to return on the next API call.
    /// The error is consumed after one use.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    pub async fn fail_next(&self, error: ApiError) {
        *self.error.lock().await = Some(error);
    }

    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    async fn check_error(&self) -> Result<()> {
        let mut error = self.error.lock().await;
        match error.take() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Apply filters the way the API does; `from`/`to` are inclusive days
    fn matches(expense: &Expense, filter: &ExpenseFilter) -> bool {
        let date = expense.date;
        let day = date.date_naive();
        filter.month.is_none_or(|m| date.month() == m)
            && filter.year.is_none_or(|y| date.year() == y)
            && filter.category.as_ref().is_none_or(|c| &expense.category == c)
            && Self::bound(filter.from.as_deref()).is_none_or(|from| day >= from)
            && Self::bound(filter.to.as_deref()).is_none_or(|to| day <= to)
    }

    fn bound(raw: Option<&str>) -> Option<NaiveDate> {
        raw.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    /// Parse `id,title,amount,date,category[,recurring,recurrenceType,notes]` rows
    fn parse_row(line: &str) -> std::result::Result<ExpenseInput, String> {
        let cols: Vec<&str> = line.split(',').map(|c| c.trim().trim_matches('"')).collect();
        if cols.len() < 5 {
            return Err(format!("Expected at least 5 columns, got {}", cols.len()));
        }
        let amount: f64 = cols[2]
            .parse()
            .map_err(|_| format!("Invalid amount: {}", cols[2]))?;
        let date = NaiveDate::parse_from_str(cols[3], "%Y-%m-%d")
            .map_err(|_| format!("Invalid date: {}", cols[3]))?
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| format!("Invalid date: {}", cols[3]))?;
        let recurrence_type = match cols.get(6).copied() {
            Some("MONTHLY") => RecurrenceType::Monthly,
            Some("YEARLY") => RecurrenceType::Yearly,
            _ => RecurrenceType::None,
        };

        Ok(ExpenseInput {
            title: cols[1].to_string(),
            amount,
            date,
            category: cols[4].to_string(),
            recurring: cols.get(5).is_some_and(|c| *c == "Sim"),
            recurrence_type,
            notes: cols.get(7).filter(|n| !n.is_empty()).map(|n| n.to_string()),
        })
    }

    fn build(id: String, input: &ExpenseInput) -> Expense {
        Expense {
            id,
            title: input.title.clone(),
            amount: input.amount,
            date: input.date,
            category: input.category.clone(),
            recurring: input.recurring,
            recurrence_type: input.recurrence_type,
            notes: input.notes.clone(),
            user_id: None,
            created_at: None,
        }
    }
}

#[async_trait]
impl ExpenseApi for MockExpenseClient {
    async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        self.check_error().await?;
        self.call_count.lock().await.list_expenses += 1;

        let mut listed: Vec<Expense> = self
            .expenses
            .lock()
            .await
            .iter()
            .filter(|e| Self::matches(e, filter))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(listed)
    }

    async fn get_expense(&self, id: &str) -> Result<Expense> {
        self.check_error().await?;
        self.call_count.lock().await.get_expense += 1;

        self.expenses
            .lock()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Expense {}", id)).into())
    }

    async fn create_expense(&self, input: &ExpenseInput) -> Result<Expense> {
        self.check_error().await?;
        self.call_count.lock().await.create_expense += 1;

        let id = {
            let mut next = self.next_id.lock().await;
            *next += 1;
            format!("mock-{}", *next)
        };
        let expense = Self::build(id, input);
        self.expenses.lock().await.push(expense.clone());
        Ok(expense)
    }

    async fn update_expense(&self, id: &str, input: &ExpenseInput) -> Result<Expense> {
        self.check_error().await?;
        self.call_count.lock().await.update_expense += 1;

        let mut expenses = self.expenses.lock().await;
        let slot = expenses
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Expense {}", id)))?;
        *slot = Self::build(id.to_string(), input);
        Ok(slot.clone())
    }

    async fn delete_expense(&self, id: &str) -> Result<()> {
        self.check_error().await?;
        self.call_count.lock().await.delete_expense += 1;

        let mut expenses = self.expenses.lock().await;
        let before = expenses.len();
        expenses.retain(|e| e.id != id);
        if expenses.len() == before {
            return Err(ApiError::NotFound(format!("Expense {}", id)).into());
        }
        Ok(())
    }

    async fn import_expenses(&self, _file_name: &str, csv: &[u8]) -> Result<ImportSummary> {
        self.check_error().await?;
        self.call_count.lock().await.import_expenses += 1;

        let text = String::from_utf8_lossy(csv);
        let mut parsed = Vec::new();
        let mut errors = Vec::new();
        // Line 1 is the header
        for (index, line) in text.lines().filter(|l| !l.trim().is_empty()).enumerate().skip(1) {
            match Self::parse_row(line) {
                Ok(input) => parsed.push(input),
                Err(error) => errors.push(ImportRowError {
                    line: index as u32 + 1,
                    errors: Vec::new(),
                    error: Some(error),
                }),
            }
        }

        let mut next = self.next_id.lock().await;
        let mut expenses = self.expenses.lock().await;
        for input in &parsed {
            *next += 1;
            expenses.push(Self::build(format!("mock-{}", *next), input));
        }

        Ok(ImportSummary {
            success: true,
            imported: parsed.len() as u32,
            errors,
        })
    }

    async fn report(&self, request: &ReportRequest) -> Result<Report> {
        self.check_error().await?;
        self.call_count.lock().await.report += 1;

        let expenses = self.expenses.lock().await;
        let report = match *request {
            ReportRequest::Monthly { year, month } => {
                let mut by_category: Vec<CategoryTotal> = Vec::new();
                let mut total = 0.0;
                for e in expenses
                    .iter()
                    .filter(|e| e.date.year() == year && e.date.month() == month)
                {
                    total += e.amount;
                    match by_category.iter_mut().find(|c| c.category == e.category) {
                        Some(entry) => {
                            entry.total += e.amount;
                            entry.count += 1;
                        }
                        None => by_category.push(CategoryTotal {
                            category: e.category.clone(),
                            total: e.amount,
                            count: 1,
                        }),
                    }
                }
                Report::Monthly {
                    year,
                    month,
                    total,
                    by_category,
                }
            }
            ReportRequest::Yearly { year } => {
                let mut by_month: Vec<MonthTotal> = (1..=12)
                    .map(|month| MonthTotal {
                        month,
                        total: 0.0,
                        count: 0,
                    })
                    .collect();
                let mut total = 0.0;
                for e in expenses.iter().filter(|e| e.date.year() == year) {
                    let slot = &mut by_month[e.date.month0() as usize];
                    slot.total += e.amount;
                    slot.count += 1;
                    total += e.amount;
                }
                Report::Yearly {
                    year,
                    total,
                    by_month,
                }
            }
        };
        Ok(report)
    }
}
