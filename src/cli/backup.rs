use anyhow::{ensure, Context, Result};
use std::path::Path;

use super::open_store;
use scuttlebutt::config::ScuttlebuttConfig;

/// Write a consistent copy of the database to `dest`.
pub fn backup(config: &ScuttlebuttConfig, dest: &Path) -> Result<()> {
    ensure!(!dest.exists(), "{} already exists", dest.display());
    let store = open_store(config)?;
    store
        .backup_to(dest)
        .with_context(|| format!("failed to write backup to {}", dest.display()))?;
    println!("Backup written to {}", dest.display());
    Ok(())
}
