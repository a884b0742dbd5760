//! Expense API resources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::KeyParams;

/// How an expense repeats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrenceType {
    #[default]
    None,
    Monthly,
    Yearly,
}

/// Expense record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,

    pub title: String,

    pub amount: f64,

    pub date: DateTime<Utc>,

    pub category: String,

    #[serde(default)]
    pub recurring: bool,

    #[serde(default)]
    pub recurrence_type: RecurrenceType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body for creating or updating an expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    pub title: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub category: String,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Filters for listing expenses; only present fields are sent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub category: Option<String>,
    /// Inclusive start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// Inclusive end date (YYYY-MM-DD)
    pub to: Option<String>,
}

impl ExpenseFilter {
    /// Query string pairs in request order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![];
        if let Some(month) = self.month {
            pairs.push(("month", month.to_string()));
        }
        if let Some(year) = self.year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(ref category) = self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(ref from) = self.from {
            pairs.push(("from", from.clone()));
        }
        if let Some(ref to) = self.to {
            pairs.push(("to", to.clone()));
        }
        pairs
    }

    /// Parameters folded into the listing cache key
    pub fn key_params(&self) -> KeyParams {
        KeyParams::new()
            .with_opt("month", self.month)
            .with_opt("year", self.year)
            .with_opt("category", self.category.clone())
            .with_opt("from", self.from.clone())
            .with_opt("to", self.to.clone())
    }
}

/// Which aggregate to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportRequest {
    Monthly { year: i32, month: u32 },
    Yearly { year: i32 },
}

impl ReportRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            ReportRequest::Monthly { .. } => "monthly",
            ReportRequest::Yearly { .. } => "yearly",
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match *self {
            ReportRequest::Monthly { year, month } => vec![
                ("type", self.kind().to_string()),
                ("year", year.to_string()),
                ("month", month.to_string()),
            ],
            ReportRequest::Yearly { year } => {
                vec![("type", self.kind().to_string()), ("year", year.to_string())]
            }
        }
    }

    pub fn key_params(&self) -> KeyParams {
        match *self {
            ReportRequest::Monthly { year, month } => KeyParams::new()
                .with("type", self.kind())
                .with("year", year)
                .with("month", month),
            ReportRequest::Yearly { year } => {
                KeyParams::new().with("type", self.kind()).with("year", year)
            }
        }
    }
}

/// Total for one category within a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    #[serde(rename = "categoria")]
    pub category: String,
    pub total: f64,
    #[serde(rename = "quantidade")]
    pub count: u32,
}

/// Total for one month within a year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthTotal {
    #[serde(rename = "mes")]
    pub month: u32,
    pub total: f64,
    #[serde(rename = "quantidade")]
    pub count: u32,
}

/// Aggregate report as returned by `/expenses/report`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum Report {
    Monthly {
        #[serde(rename = "ano")]
        year: i32,
        #[serde(rename = "mes")]
        month: u32,
        #[serde(rename = "totalGeral")]
        total: f64,
        #[serde(rename = "porCategoria")]
        by_category: Vec<CategoryTotal>,
    },
    Yearly {
        #[serde(rename = "ano")]
        year: i32,
        #[serde(rename = "totalGeral")]
        total: f64,
        #[serde(rename = "porMes")]
        by_month: Vec<MonthTotal>,
    },
}

impl Report {
    pub fn total(&self) -> f64 {
        match self {
            Report::Monthly { total, .. } | Report::Yearly { total, .. } => *total,
        }
    }
}

/// Result of a bulk CSV import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(rename = "sucesso", default)]
    pub success: bool,
    /// Rows stored by the server
    #[serde(rename = "importadas")]
    pub imported: u32,
    /// Rows the server rejected
    #[serde(rename = "erros", default)]
    pub errors: Vec<ImportRowError>,
}

/// One rejected CSV row; `line` counts the header as line 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRowError {
    #[serde(rename = "linha")]
    pub line: u32,
    /// Validation failures
    #[serde(rename = "erros", default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Parse failure
    #[serde(rename = "erro", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
