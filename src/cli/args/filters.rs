//! Filter argument types for CLI commands

use clap::Args;

use crate::client::ExpenseFilter;

/// Filter arguments for the expense list command.
///
/// Absent flags are not sent, so `--year 2025` and `--year 2025 --month 3`
/// are cached as different listings.
#[derive(Args, Debug, Default, Clone)]
pub struct ExpenseFilterArgs {
    /// Filter by month (1-12)
    #[arg(long, short = 'm', value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Filter by year
    #[arg(long, short = 'y')]
    pub year: Option<i32>,

    /// Filter by category
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Start date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: Option<String>,
}

impl From<&ExpenseFilterArgs> for ExpenseFilter {
    fn from(args: &ExpenseFilterArgs) -> Self {
        Self {
            month: args.month,
            year: args.year,
            category: args.category.clone(),
            from: args.from.clone(),
            to: args.to.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_conversion() {
        let args = ExpenseFilterArgs {
            month: Some(3),
            category: Some("food".to_string()),
            ..Default::default()
        };
        let filter = ExpenseFilter::from(&args);

        assert_eq!(filter.month, Some(3));
        assert_eq!(filter.category.as_deref(), Some("food"));
        assert!(filter.year.is_none());
    }
}
