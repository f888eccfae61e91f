//! Where notifications go.

pub mod log;
pub mod webhook;

pub use self::log::LogSink;
pub use webhook::WebhookSink;

use async_trait::async_trait;

use crate::repository::Repository;
use crate::schedule::Account;

/// Longest notification text, in characters.
pub const MAX_TEXT_LEN: usize = 140;

const ELLIPSIS: &str = "...";

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Publishes a chosen repository on behalf of an account.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Returns the ID the remote side assigned to the published message.
    async fn send(&self, account: &Account, repository: &Repository) -> Result<u64, SinkError>;
}

/// `"owner/name - description url"`, at most [`MAX_TEXT_LEN`] characters.
///
/// Only the description is shortened. It is cut with `...` when too long, and
/// dropped altogether when fewer than three characters would remain for it.
pub fn notify_text(repository: &Repository) -> String {
    let name = repository.name();
    let url = repository.web_url();
    let fixed = name.chars().count() + " -  ".len() + url.chars().count();
    let remaining = MAX_TEXT_LEN.saturating_sub(fixed);

    let description = repository.description.trim();
    let description = if remaining < ELLIPSIS.len() {
        String::new()
    } else if description.chars().count() > remaining {
        let cut: String = description.chars().take(remaining - ELLIPSIS.len()).collect();
        format!("{}{ELLIPSIS}", cut.trim_end())
    } else {
        description.to_string()
    };

    format!("{name} - {description} {url}")
}
