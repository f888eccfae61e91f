use serde::Serialize;

use crate::db::Bucket;
use crate::error::Result;

use super::Store;

/// Counts across all partitions, taken from one snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub repositories: u64,
    pub messages: u64,
    pub notified: u64,
    pub blacklisted: u64,
    pub accounts: u64,
    pub languages: u64,
    pub db_size_bytes: u64,
}

impl Store {
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stats = self.view(|s| {
            let mut stats = StoreStats {
                blacklisted: Bucket::Blacklist.count(s.conn())?,
                accounts: Bucket::Status.count(s.conn())?,
                ..Default::default()
            };
            let mut languages = std::collections::HashSet::new();
            s.for_each_repository(|r| {
                stats.repositories += 1;
                stats.messages += r.messages.len() as u64;
                if r.notified {
                    stats.notified += 1;
                }
                languages.insert(r.language);
            })?;
            stats.languages = languages.len() as u64;
            Ok(stats)
        })?;

        stats.db_size_bytes = self
            .path()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);
        Ok(stats)
    }
}
