use anyhow::Result;

use super::{format_bytes, open_store};
use scuttlebutt::config::ScuttlebuttConfig;

/// Display store statistics in the terminal.
pub fn stats(config: &ScuttlebuttConfig) -> Result<()> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    println!("Store Statistics");
    println!("{}", "=".repeat(40));
    println!("  Repositories:        {}", stats.repositories);
    println!("  Messages:            {}", stats.messages);
    println!("  Languages:           {}", stats.languages);
    println!("  Notified:            {}", stats.notified);
    println!("  Blacklisted:         {}", stats.blacklisted);
    println!("  Accounts with status: {}", stats.accounts);
    println!();
    println!("Database size:         {}", format_bytes(stats.db_size_bytes));

    Ok(())
}
