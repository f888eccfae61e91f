//! Persisted record shapes.
//!
//! [`Repository`] (with its ordered [`Message`]s) lives in the `repositories`
//! partition, [`AccountStatus`] in `status`. [`Mention`] is the pair delivered by a
//! message source and is never stored as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RepositoryId;

/// One observed reference to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Source-assigned ID. Unique within the owning repository only.
    pub id: u64,
    /// Free text of the mention.
    pub text: String,
}

impl Message {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// A message together with the repository it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub repository_id: RepositoryId,
    pub message: Message,
}

/// A tracked repository and its mention history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Language tag. The empty string is a valid language bucket of its own.
    #[serde(default)]
    pub language: String,
    /// Set once the repository has been announced; mirrors its blacklist entry.
    #[serde(default)]
    pub notified: bool,
    /// Append-only, in insertion order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Repository {
    /// A fresh record with no messages and not yet notified.
    pub fn new(
        id: RepositoryId,
        url: impl Into<String>,
        description: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id,
            url: url.into(),
            description: description.into(),
            language: language.into(),
            notified: false,
            messages: Vec::new(),
        }
    }

    /// `owner/name`.
    pub fn name(&self) -> &str {
        self.id.short_name()
    }

    /// Canonical web URL, falling back to `https://{id}` when none was resolved.
    pub fn web_url(&self) -> String {
        if self.url.is_empty() {
            format!("https://{}", self.id)
        } else {
            self.url.clone()
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn has_message(&self, id: u64) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }
}

/// Per-account notification bookkeeping, keyed by account username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    /// Time of the last successful notification; `None` means never notified.
    #[serde(default)]
    pub notify_time: Option<DateTime<Utc>>,
}

impl AccountStatus {
    pub fn notified_at(time: DateTime<Utc>) -> Self {
        Self {
            notify_time: Some(time),
        }
    }
}
