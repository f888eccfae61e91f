//! Where mentions come from.

pub mod search;

pub use search::{extract_repository_id, SearchSource};

use async_trait::async_trait;

use crate::repository::Mention;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid search url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

/// A feed of messages that mention repositories.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Mentions in messages newer than `since_id` (0 means "from the start").
    ///
    /// Messages that mention no repository are dropped, so the highest message
    /// ID seen is returned separately for the caller's high-water mark.
    async fn poll(&self, since_id: u64) -> Result<Poll, SourceError>;
}

/// One batch from a [`MessageSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Poll {
    pub mentions: Vec<Mention>,
    /// Highest message ID in the batch, whether or not it mentioned a repository.
    pub max_id: Option<u64>,
}
