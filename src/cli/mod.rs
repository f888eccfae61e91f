pub mod backup;
pub mod blacklist;
pub mod doctor;
pub mod query;
pub mod stats;

use anyhow::Result;

use scuttlebutt::config::ScuttlebuttConfig;
use scuttlebutt::store::Store;

/// Open the configured store for a one-shot command.
fn open_store(config: &ScuttlebuttConfig) -> Result<Store> {
    let db_path = config.resolved_db_path();
    tracing::debug!(db = %db_path.display(), "opening store");
    Store::open(&db_path)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
