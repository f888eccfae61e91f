use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use super::{notify_text, NotificationSink, SinkError};
use crate::repository::Repository;
use crate::schedule::Account;

/// Dry-run sink: logs the text instead of publishing it.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    sent: Arc<AtomicU64>,
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, account: &Account, repository: &Repository) -> Result<u64, SinkError> {
        let id = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            account = %account.username,
            repository = %repository.id,
            text = %notify_text(repository),
            "dry run notification"
        );
        Ok(id)
    }
}
