//! Store-level error taxonomy.

use std::time::Duration;

use crate::resolver::ResolveError;

/// Errors surfaced by [`crate::store::Store`]. Every variant except
/// [`StoreError::InvalidArgument`] is raised from inside a transaction, which is
/// rolled back before the error reaches the caller.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Malformed repository ID or empty message ID; rejected before any transaction.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Repository absent locally and unknown to the resolver.
    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("resolve {id}: {source}")]
    Resolver {
        id: String,
        #[source]
        source: ResolveError,
    },

    #[error("resolve {id}: timed out after {timeout:?}")]
    ResolverTimeout { id: String, timeout: Duration },

    /// A stored record could not be decoded (or encoded).
    #[error("corrupt record {partition}/{key}: {source}")]
    Serialization {
        partition: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
