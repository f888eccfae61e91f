//! CLI `blacklist` commands: list, add and remove exclusions.

use anyhow::{Context, Result};

use super::open_store;
use scuttlebutt::config::ScuttlebuttConfig;
use scuttlebutt::repository::RepositoryId;

pub fn list(config: &ScuttlebuttConfig) -> Result<()> {
    let store = open_store(config)?;
    let ids = store.blacklist()?;
    if ids.is_empty() {
        println!("Blacklist is empty.");
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}

pub fn add(config: &ScuttlebuttConfig, id: &str) -> Result<()> {
    let id = RepositoryId::parse(id).context("invalid repository ID")?;
    let store = open_store(config)?;
    store.add_to_blacklist(&id)?;
    tracing::info!(repository = %id, "added to blacklist");
    println!("Blacklisted {id}");
    Ok(())
}

pub fn remove(config: &ScuttlebuttConfig, id: &str) -> Result<()> {
    let id = RepositoryId::parse(id).context("invalid repository ID")?;
    let store = open_store(config)?;
    if store.remove_from_blacklist(&id)? {
        tracing::info!(repository = %id, "removed from blacklist");
        println!("Removed {id}; it is eligible again.");
    } else {
        println!("{id} was not blacklisted.");
    }
    Ok(())
}
