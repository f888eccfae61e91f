//! Structured repository identifiers of the form `host/owner/name`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// A repository identifier: exactly three non-empty `/`-separated segments,
/// e.g. `github.com/acme/widget`. Used verbatim as the storage key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Parse and validate an identifier.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        let segments: Vec<&str> = s.split('/').collect();
        if segments.len() != 3 {
            return Err(StoreError::InvalidArgument(format!(
                "repository id must have 3 segments (host/owner/name): {s:?}"
            )));
        }
        if segments.iter().any(|seg| seg.trim().is_empty()) {
            return Err(StoreError::InvalidArgument(format!(
                "repository id has an empty segment: {s:?}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segment(&self, n: usize) -> &str {
        // Validated in `parse`, so there are always three segments.
        self.0.split('/').nth(n).unwrap_or_default()
    }

    /// Code-hosting host, e.g. `github.com`.
    pub fn host(&self) -> &str {
        self.segment(0)
    }

    pub fn owner(&self) -> &str {
        self.segment(1)
    }

    pub fn name(&self) -> &str {
        self.segment(2)
    }

    /// `owner/name`, the short form used in notification text.
    pub fn short_name(&self) -> &str {
        let host_len = self.host().len();
        &self.0[host_len + 1..]
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RepositoryId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RepositoryId> for String {
    fn from(id: RepositoryId) -> Self {
        id.0
    }
}
