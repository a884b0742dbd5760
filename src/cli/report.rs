//! Report commands

use colored::Colorize;

use crate::cli::{CommandContext, OutputFormat};
use crate::client::{ExpenseApi, Report, ReportRequest};
use crate::error::Result;

/// Fetch and print a report
pub async fn show(ctx: &CommandContext, request: ReportRequest) -> Result<()> {
    let client = ctx.client()?;
    let report = client.report(&request).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Pretty => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &Report) {
    match report {
        Report::Monthly {
            year,
            month,
            total,
            by_category,
        } => {
            println!("{}", format!("Expenses {:04}-{:02}", year, month).bold());
            for entry in by_category {
                println!(
                    "  {:<16} {:>10.2}  ({} items)",
                    entry.category, entry.total, entry.count
                );
            }
            println!("  {:<16} {:>10.2}", "Total", total);
        }
        Report::Yearly {
            year,
            total,
            by_month,
        } => {
            println!("{}", format!("Expenses {}", year).bold());
            for entry in by_month.iter().filter(|m| m.count > 0) {
                println!(
                    "  {:02}  {:>10.2}  ({} items)",
                    entry.month, entry.total, entry.count
                );
            }
            println!("  All {:>10.2}", total);
        }
    }
}
