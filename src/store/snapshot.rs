//! Transaction-scoped views over the partitions.
//!
//! A [`Snapshot`] wraps a read transaction and only reads; a [`WriteTx`] wraps an
//! immediate write transaction and derefs to `Snapshot` for its reads. Neither
//! commits on its own: [`Store::view`](super::Store::view) and
//! [`Store::update`](super::Store::update) own the transaction boundaries.

use rusqlite::Connection;
use std::collections::{BTreeSet, HashSet};
use std::ops::Deref;

use crate::db::Bucket;
use crate::error::{Result, StoreError};
use crate::repository::{AccountStatus, Message, Repository, RepositoryId};

/// Read access inside one transaction.
pub struct Snapshot<'a> {
    conn: &'a Connection,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Fetch a repository. A record that fails to decode is an error here.
    pub fn repository(&self, id: &RepositoryId) -> Result<Option<Repository>> {
        match Bucket::Repositories.get(self.conn, id.as_str())? {
            Some(value) => decode_repository(id.as_str(), &value).map(Some),
            None => Ok(None),
        }
    }

    /// Visit every repository in ascending ID order. Records that fail to decode
    /// are logged and skipped so one bad entry cannot hide the rest.
    pub fn for_each_repository<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(Repository),
    {
        Bucket::Repositories.for_each(self.conn, |key, value| {
            match decode_repository(&key, &value) {
                Ok(repo) => f(repo),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping undecodable repository")
                }
            }
        })?;
        Ok(())
    }

    pub fn repositories(&self) -> Result<Vec<Repository>> {
        let mut out = Vec::new();
        self.for_each_repository(|r| out.push(r))?;
        Ok(out)
    }

    pub fn repository_count(&self) -> Result<u64> {
        Ok(Bucket::Repositories.count(self.conn)?)
    }

    /// Blacklisted repository IDs, in ascending order. Keys that are not valid IDs
    /// are logged and left out.
    pub fn blacklist(&self) -> Result<BTreeSet<RepositoryId>> {
        let mut out = BTreeSet::new();
        for key in Bucket::Blacklist.keys(self.conn)? {
            match RepositoryId::parse(&key) {
                Ok(id) => {
                    out.insert(id);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "ignoring malformed blacklist key")
                }
            }
        }
        Ok(out)
    }

    /// Raw blacklist keys for membership tests during a scan.
    pub(crate) fn blacklist_keys(&self) -> Result<HashSet<String>> {
        Ok(Bucket::Blacklist.keys(self.conn)?.into_iter().collect())
    }

    pub fn is_blacklisted(&self, id: &RepositoryId) -> Result<bool> {
        Ok(Bucket::Blacklist.contains(self.conn, id.as_str())?)
    }

    /// Whether the aggregator must skip this repository.
    pub fn is_excluded(&self, repo: &Repository) -> Result<bool> {
        Ok(repo.notified || self.is_blacklisted(&repo.id)?)
    }

    /// Status for an account; a missing record reads as "never notified".
    pub fn account_status(&self, username: &str) -> Result<AccountStatus> {
        match Bucket::Status.get(self.conn, username)? {
            Some(value) if !value.is_empty() => {
                serde_json::from_str(&value).map_err(|source| StoreError::Serialization {
                    partition: Bucket::Status.as_str(),
                    key: username.to_string(),
                    source,
                })
            }
            _ => Ok(AccountStatus::default()),
        }
    }

    pub fn meta(&self, key: &str) -> Result<Option<String>> {
        Ok(Bucket::Meta.get(self.conn, key)?)
    }

    pub(crate) fn conn(&self) -> &Connection {
        self.conn
    }
}

/// Read-write access inside one immediate transaction.
pub struct WriteTx<'a> {
    snapshot: Snapshot<'a>,
}

impl<'a> Deref for WriteTx<'a> {
    type Target = Snapshot<'a>;

    fn deref(&self) -> &Self::Target {
        &self.snapshot
    }
}

impl<'a> WriteTx<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self {
            snapshot: Snapshot::new(conn),
        }
    }

    /// Upsert by ID, overwriting any existing record.
    pub fn put_repository(&self, repo: &Repository) -> Result<()> {
        let value = serde_json::to_string(repo).map_err(|source| StoreError::Serialization {
            partition: Bucket::Repositories.as_str(),
            key: repo.id.to_string(),
            source,
        })?;
        Bucket::Repositories.put(self.conn(), repo.id.as_str(), &value)?;
        Ok(())
    }

    /// Append `message` unless one with the same ID is already present.
    /// Returns `false` for a duplicate, in which case nothing is written.
    pub fn append_message(&self, repo: &mut Repository, message: Message) -> Result<bool> {
        if repo.has_message(message.id) {
            return Ok(false);
        }
        repo.messages.push(message);
        self.put_repository(repo)?;
        Ok(true)
    }

    /// Flag the repository as notified and add it to the blacklist.
    pub fn mark_notified(&self, id: &RepositoryId) -> Result<()> {
        let mut repo = self
            .repository(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !repo.notified {
            repo.notified = true;
            self.put_repository(&repo)?;
        }
        Bucket::Blacklist.put(self.conn(), id.as_str(), "")?;
        Ok(())
    }

    /// The repository does not need to exist locally.
    pub fn add_to_blacklist(&self, id: &RepositoryId) -> Result<()> {
        Bucket::Blacklist.put(self.conn(), id.as_str(), "")?;
        Ok(())
    }

    /// Remove the blacklist entry and clear the notified flag, making the
    /// repository eligible again. Returns whether an entry was removed.
    pub fn remove_from_blacklist(&self, id: &RepositoryId) -> Result<bool> {
        let removed = Bucket::Blacklist.delete(self.conn(), id.as_str())?;
        if let Some(mut repo) = self.repository(id)? {
            if repo.notified {
                repo.notified = false;
                self.put_repository(&repo)?;
            }
        }
        Ok(removed)
    }

    pub fn set_account_status(&self, username: &str, status: &AccountStatus) -> Result<()> {
        if username.is_empty() {
            return Err(StoreError::InvalidArgument("account username is empty".into()));
        }
        let value = serde_json::to_string(status).map_err(|source| StoreError::Serialization {
            partition: Bucket::Status.as_str(),
            key: username.to_string(),
            source,
        })?;
        Bucket::Status.put(self.conn(), username, &value)?;
        Ok(())
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        Bucket::Meta.put(self.conn(), key, value)?;
        Ok(())
    }
}

fn decode_repository(key: &str, value: &str) -> Result<Repository> {
    serde_json::from_str(value).map_err(|source| StoreError::Serialization {
        partition: Bucket::Repositories.as_str(),
        key: key.to_string(),
        source,
    })
}
