//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use super::format_bytes;
use scuttlebutt::config::ScuttlebuttConfig;
use scuttlebutt::db;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &ScuttlebuttConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `scuttlebutt serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Scuttlebutt Health Report");
    println!("=========================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Row counts:");
    println!("  Repositories:    {}", report.repository_count);
    println!("  Blacklist:       {}", report.blacklist_count);
    println!("  Account status:  {}", report.status_count);
    println!("  Meta:            {}", report.meta_count);
    println!();
    println!("Accounts configured: {}", config.accounts.len());
    for account in &config.accounts {
        let sink = if account.webhook_url.is_some() { "webhook" } else { "dry run" };
        println!("  {:<20} {:<12} {}", account.username, display_language(&account.language), sink);
    }
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Stop the server.");
        println!("  2. Restore from a backup: cp backup.db {}", db_path.display());
        println!("     (take backups with `scuttlebutt backup PATH` or GET /backup)");
    }

    Ok(())
}

fn display_language(language: &str) -> &str {
    if language.is_empty() {
        "(none)"
    } else {
        language
    }
}
