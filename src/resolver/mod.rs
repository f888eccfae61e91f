//! Fallback repository metadata, consulted on a local cache miss.
//!
//! [`MetadataResolver`] is the seam; [`github::GitHubResolver`] is the
//! production implementation.

pub mod github;

pub use github::GitHubResolver;

use async_trait::async_trait;

use crate::repository::{Repository, RepositoryId};

/// Errors from a resolver. "No such repository" is not an error: it is `Ok(None)`.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate limited until {reset}")]
    RateLimited { reset: String },
}

#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Look up metadata for `id`. The returned record's messages are ignored.
    async fn resolve(&self, id: &RepositoryId) -> Result<Option<Repository>, ResolveError>;
}
