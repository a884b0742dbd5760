//! CLI command definitions and handlers

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod args;
pub mod cache;
pub mod context;
pub mod expense;
pub mod report;

pub use args::{ExpenseFilterArgs, GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// VittaCash CLI - cached access to the VittaCash expense API
#[derive(Parser, Debug)]
#[command(name = "vittacash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, json)
    #[arg(
        long,
        global = true,
        env = "VITTACASH_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "VITTACASH_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "VITTACASH_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Skip cached entries, fetch fresh data from API
    #[arg(long, global = true, env = "VITTACASH_NO_CACHE", hide_env = true)]
    pub no_cache: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the local response cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// List and manage expenses
    #[command(subcommand)]
    Expenses(ExpenseCommands),

    /// Monthly and yearly expense reports
    #[command(subcommand)]
    Report(ReportCommands),
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show entry counts for both tiers
    Status,
    /// Remove every cached entry
    Clear,
    /// Remove expired entries now
    Sweep,
    /// Print the persistent cache location
    Path,
}

/// Expense subcommands
#[derive(Subcommand, Debug)]
pub enum ExpenseCommands {
    /// List expenses, newest first
    List {
        #[command(flatten)]
        filters: ExpenseFilterArgs,
    },
    /// Show a single expense
    Get {
        /// Expense ID
        id: String,
    },
    /// Delete an expense
    Delete {
        /// Expense ID
        id: String,
    },
    /// Import expenses from a CSV file
    Import {
        /// CSV file with a header row
        file: PathBuf,
    },
}

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Totals per category for one month
    Monthly {
        #[arg(long, short = 'y')]
        year: i32,
        #[arg(long, short = 'm', value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
    /// Totals per month for one year
    Yearly {
        #[arg(long, short = 'y')]
        year: i32,
    },
}
