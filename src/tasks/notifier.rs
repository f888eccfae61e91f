//! Periodically announces the top repository per language to every due account.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{run_every, Shutdown, TaskError};
use crate::repository::AccountStatus;
use crate::schedule::Account;
use crate::sink::NotificationSink;
use crate::store::Store;

/// One notification that went out during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub account: String,
    pub repository: String,
    pub message_id: u64,
}

pub struct Notifier {
    store: Store,
    sink: Arc<dyn NotificationSink>,
    accounts: Arc<Vec<Account>>,
    interval: Duration,
}

impl Notifier {
    pub fn new(
        store: Store,
        sink: Arc<dyn NotificationSink>,
        accounts: Vec<Account>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            sink,
            accounts: Arc::new(accounts),
            interval,
        }
    }

    /// One pass: pick due accounts, rank candidates, send, record.
    ///
    /// Each repository goes out at most once per tick even when several due
    /// accounts share a language. A failed send leaves the account due and the
    /// repository eligible; a failed record is logged, since the message is out.
    pub async fn tick(&self) -> Result<Vec<Sent>, TaskError> {
        let now = Utc::now();
        let (accounts, interval) = (self.accounts.clone(), self.interval);
        let due: Vec<Account> = self
            .store
            .blocking(move |s| {
                s.notifiable_accounts_at(&accounts, interval, now)
                    .map(|due| due.into_iter().cloned().collect())
            })
            .await?;
        if due.is_empty() {
            debug!("no accounts due");
            return Ok(Vec::new());
        }

        let mut top = self
            .store
            .blocking(|s| s.top_repositories_by_language())
            .await?;

        let mut sent = Vec::new();
        for account in due {
            let Some(repository) = top.remove(&account.language) else {
                debug!(
                    account = %account.username,
                    language = %account.language,
                    "no candidate for language"
                );
                continue;
            };

            let message_id = match self.sink.send(&account, &repository).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(
                        account = %account.username,
                        repository = %repository.id,
                        error = %e,
                        "notification failed"
                    );
                    top.insert(account.language.clone(), repository);
                    continue;
                }
            };

            let status = AccountStatus::notified_at(Utc::now());
            let (username, id) = (account.username.clone(), repository.id.clone());
            if let Err(e) = self
                .store
                .blocking(move |s| s.record_notification(&username, &status, &id))
                .await
            {
                warn!(
                    account = %account.username,
                    repository = %repository.id,
                    error = %e,
                    "sent but failed to record notification"
                );
            }

            info!(
                account = %account.username,
                repository = %repository.id,
                messages = repository.message_count(),
                message_id,
                "notification sent"
            );
            sent.push(Sent {
                account: account.username,
                repository: repository.id.to_string(),
                message_id,
            });
        }
        Ok(sent)
    }

    pub async fn run(self, every: Duration, shutdown: Shutdown) {
        let this = &self;
        run_every("notifier", every, shutdown, move || async move {
            if let Err(e) = this.tick().await {
                warn!(error = %e, "notifier tick failed; retrying next tick");
            }
        })
        .await;
    }
}
