//! Expense commands

use colored::Colorize;
use std::path::Path;

use crate::cli::{CommandContext, ExpenseFilterArgs, OutputFormat};
use crate::client::{Expense, ExpenseApi, ExpenseFilter};
use crate::error::Result;

/// List expenses matching the filters
pub async fn list(ctx: &CommandContext, filters: &ExpenseFilterArgs) -> Result<()> {
    let client = ctx.client()?;
    let expenses = client.list_expenses(&ExpenseFilter::from(filters)).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&expenses)?),
        OutputFormat::Pretty => {
            if expenses.is_empty() {
                println!("No expenses found");
                return Ok(());
            }
            for expense in &expenses {
                println!("{}", expense_line(expense));
            }
            let total: f64 = expenses.iter().map(|e| e.amount).sum();
            println!(
                "\n{} expenses, total {}",
                expenses.len(),
                format!("{:.2}", total).bold()
            );
        }
    }

    Ok(())
}

/// Show a single expense
pub async fn get(ctx: &CommandContext, id: &str) -> Result<()> {
    let client = ctx.client()?;
    let expense = client.get_expense(id).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&expense)?),
        OutputFormat::Pretty => {
            println!("{}", expense.title.bold());
            println!("ID:        {}", expense.id);
            println!("Amount:    {:.2}", expense.amount);
            println!("Date:      {}", expense.date.format("%Y-%m-%d"));
            println!("Category:  {}", expense.category);
            if expense.recurring {
                println!("Recurring: {:?}", expense.recurrence_type);
            }
            if let Some(ref notes) = expense.notes {
                println!("Notes:     {}", notes);
            }
        }
    }

    Ok(())
}

/// Delete an expense; cached listings and reports for the user are dropped
pub async fn delete(ctx: &CommandContext, id: &str) -> Result<()> {
    let client = ctx.client()?;
    client.delete_expense(id).await?;

    match ctx.format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "deleted": id, "success": true });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => println!("{} Deleted expense {}", "✓".green(), id),
    }

    Ok(())
}

/// Upload a CSV file; cached listings and reports for the user are dropped
pub async fn import(ctx: &CommandContext, file: &Path) -> Result<()> {
    let contents = std::fs::read(file)?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "import.csv".to_string());

    let client = ctx.client()?;
    let summary = client.import_expenses(&file_name, &contents).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Pretty => {
            println!("{} Imported {} expenses", "✓".green(), summary.imported);
            for row in &summary.errors {
                let reason = match row.error {
                    Some(ref error) => error.clone(),
                    None => row.errors.join("; "),
                };
                println!("  {} line {}: {}", "✗".red(), row.line, reason);
            }
        }
    }

    Ok(())
}

fn expense_line(expense: &Expense) -> String {
    format!(
        "{}  {:>10.2}  {:<14} {} {}",
        expense.date.format("%Y-%m-%d"),
        expense.amount,
        expense.category,
        expense.title,
        format!("({})", expense.id).dimmed()
    )
}
