//! Cache management commands

use colored::Colorize;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;

/// Show cache status/statistics
pub fn status(ctx: &CommandContext) -> Result<()> {
    let stats = ctx.cache.stats();
    let location = ctx.cache.persistent().location();
    let size_bytes = location
        .as_ref()
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    match ctx.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "schema_version": ctx.cache.persistent().version(),
                "volatile": {
                    "total_entries": stats.volatile.total_entries,
                    "valid_entries": stats.volatile.valid_entries,
                    "expired_entries": stats.volatile.expired_entries,
                },
                "persistent": {
                    "total_entries": stats.persistent.total_entries,
                    "valid_entries": stats.persistent.valid_entries,
                    "expired_entries": stats.persistent.expired_entries,
                },
                "total_size_bytes": size_bytes,
                "total_size_human": format_size(size_bytes),
                "path": location.as_ref().map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            let path = location
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "memory only".to_string());

            println!("{}", "Cache Status".bold());
            println!("────────────────────────────────────────");
            println!("Location:       {}", path);
            println!("Schema version: {}", ctx.cache.persistent().version());
            println!("Valid entries:  {}", stats.persistent.valid_entries);
            println!("Expired:        {}", stats.persistent.expired_entries);
            println!("Total size:     {}", format_size(size_bytes));
        }
    }

    Ok(())
}

/// Clear all cache entries
pub fn clear(ctx: &CommandContext) -> Result<()> {
    let removed = ctx.cache.clear();

    match ctx.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entries_removed": removed.total(),
                "success": true,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            if removed.total() > 0 {
                println!("{} Cleared {} cache entries", "✓".green(), removed.total());
            } else {
                println!("Cache was already empty");
            }
        }
    }

    Ok(())
}

/// Remove expired entries from both tiers
pub fn sweep(ctx: &CommandContext) -> Result<()> {
    let removed = ctx.cache.sweep_expired();

    match ctx.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "volatile_removed": removed.volatile_removed,
                "persistent_removed": removed.persistent_removed,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            println!("{} Removed {} expired entries", "✓".green(), removed.total());
        }
    }

    Ok(())
}

/// Show cache path
pub fn path(ctx: &CommandContext) -> Result<()> {
    match ctx.cache.persistent().location() {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", "Persistent cache disabled (memory only)".dimmed()),
    }
    Ok(())
}

/// Format bytes as human-readable size
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
