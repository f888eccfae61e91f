//! Which notification accounts are due, given their last-notify times.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, StoreError};
use crate::repository::AccountStatus;
use crate::store::{Snapshot, Store};

/// A notification destination dedicated to one language.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub username: String,
    /// Language whose top repository this account announces. May be empty.
    #[serde(default)]
    pub language: String,
    /// Where the webhook sink posts. Without one the account runs dry (log only).
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Account {
    pub fn new(username: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            language: language.into(),
            webhook_url: None,
        }
    }
}

/// An account is due if it was never notified, or if strictly more than
/// `interval` has elapsed since its last notification. A timestamp in the
/// future is treated as "just notified".
pub fn is_due(status: &AccountStatus, interval: Duration, now: DateTime<Utc>) -> bool {
    match status.notify_time {
        None => true,
        Some(last) => match (now - last).to_std() {
            Ok(elapsed) => elapsed > interval,
            Err(_) => false,
        },
    }
}

/// Filter `accounts` down to those due at `now`. Reads only.
///
/// An account whose status record cannot be decoded is logged and left out;
/// the others are still evaluated.
pub fn notifiable_accounts<'a>(
    snapshot: &Snapshot<'_>,
    accounts: &'a [Account],
    interval: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<&'a Account>> {
    let mut due = Vec::new();
    for account in accounts {
        let status = match snapshot.account_status(&account.username) {
            Ok(status) => status,
            Err(e @ StoreError::Serialization { .. }) => {
                tracing::warn!(
                    account = %account.username,
                    error = %e,
                    "skipping account with unreadable status"
                );
                continue;
            }
            Err(e) => return Err(e),
        };
        if is_due(&status, interval, now) {
            due.push(account);
        } else {
            tracing::trace!(
                account = %account.username,
                "account notified recently; skipping"
            );
        }
    }
    Ok(due)
}

impl Store {
    /// Accounts due for a notification as of the current wall-clock time.
    pub fn notifiable_accounts<'a>(
        &self,
        accounts: &'a [Account],
        interval: Duration,
    ) -> Result<Vec<&'a Account>> {
        self.notifiable_accounts_at(accounts, interval, Utc::now())
    }

    pub fn notifiable_accounts_at<'a>(
        &self,
        accounts: &'a [Account],
        interval: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<&'a Account>> {
        self.view(|s| notifiable_accounts(s, accounts, interval, now))
    }
}
