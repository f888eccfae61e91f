//! Pulls mentions from the message source into the store.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{run_every, Shutdown, TaskError};
use crate::source::MessageSource;
use crate::store::{AddOutcome, Store};

/// Meta key holding the highest message ID seen so far.
pub const LAST_MESSAGE_ID_KEY: &str = "last_message_id";

/// Counts from one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub created: usize,
    pub appended: usize,
    pub duplicates: usize,
    pub unknown: usize,
    pub failed: usize,
}

pub struct Poller {
    store: Store,
    source: Arc<dyn MessageSource>,
}

impl Poller {
    pub fn new(store: Store, source: Arc<dyn MessageSource>) -> Self {
        Self { store, source }
    }

    /// One poll: fetch everything after the high-water mark, ingest it in
    /// message order, then advance the mark.
    ///
    /// A repository the resolver does not know is skipped for good. Any other
    /// failure stops the batch and holds the mark just below the failed
    /// message, so it is fetched again next tick; mentions already recorded
    /// come back as duplicates.
    pub async fn tick(&self) -> Result<PollSummary, TaskError> {
        let since_id = self.last_message_id().await?;
        let mut poll = self.source.poll(since_id).await?;
        poll.mentions.sort_by_key(|m| m.message.id);

        let mut summary = PollSummary::default();
        let mut failed_at = None;
        for mention in poll.mentions {
            let (id, message_id) = (mention.repository_id.clone(), mention.message.id);
            match self.store.add_message(mention).await {
                Ok(AddOutcome::Created) => summary.created += 1,
                Ok(AddOutcome::Appended) => summary.appended += 1,
                Ok(AddOutcome::Duplicate) => summary.duplicates += 1,
                Err(e) if e.is_not_found() => {
                    debug!(repository = %id, "mentioned repository does not exist");
                    summary.unknown += 1;
                }
                Err(e) => {
                    warn!(
                        repository = %id,
                        message_id,
                        error = %e,
                        "failed to record mention; retrying next tick"
                    );
                    summary.failed += 1;
                    failed_at = Some(message_id);
                    break;
                }
            }
        }

        let mark = match failed_at {
            Some(message_id) => Some(message_id.saturating_sub(1)),
            None => poll.max_id,
        };
        if let Some(mark) = mark.filter(|&m| m > since_id) {
            self.store
                .blocking(move |s| s.set_meta(LAST_MESSAGE_ID_KEY, &mark.to_string()))
                .await?;
        }

        if summary != PollSummary::default() {
            info!(
                created = summary.created,
                appended = summary.appended,
                duplicates = summary.duplicates,
                unknown = summary.unknown,
                failed = summary.failed,
                "poll ingested mentions"
            );
        }
        Ok(summary)
    }

    async fn last_message_id(&self) -> Result<u64, TaskError> {
        let raw = self
            .store
            .blocking(|s| s.meta(LAST_MESSAGE_ID_KEY))
            .await?;
        Ok(match raw {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!(value = %value, "ignoring malformed high-water mark");
                0
            }),
            None => 0,
        })
    }

    pub async fn run(self, every: Duration, shutdown: Shutdown) {
        let this = &self;
        run_every("poller", every, shutdown, move || async move {
            if let Err(e) = this.tick().await {
                warn!(error = %e, "poll failed; retrying next tick");
            }
        })
        .await;
    }
}
