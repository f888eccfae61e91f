//! The repository store: a transactional cache of repositories, their mentions,
//! the exclusion set, and per-account notification status.
//!
//! All mutations go through [`Store::update`], which runs in a single
//! `BEGIN IMMEDIATE` transaction on the one writer connection, so writers are
//! strictly serialized. Reads go through [`Store::view`]: on a file-backed store
//! each view opens its own read-only connection and sees a point-in-time snapshot
//! while a writer is in flight.

mod ingest;
pub mod snapshot;
pub mod stats;

pub use ingest::AddOutcome;
pub use snapshot::{Snapshot, WriteTx};
pub use stats::StoreStats;

use rusqlite::{Connection, TransactionBehavior};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::db;
use crate::error::{Result, StoreError};
use crate::repository::{AccountStatus, Repository, RepositoryId};
use crate::resolver::MetadataResolver;

/// Default upper bound on a single resolver call.
pub const DEFAULT_RESOLVER_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to the store. Cloning is cheap and shares the underlying connection.
#[derive(Clone)]
pub struct Store {
    writer: Arc<Mutex<Connection>>,
    path: Option<Arc<PathBuf>>,
    resolver: Option<Arc<dyn MetadataResolver>>,
    resolver_timeout: Duration,
}

impl Store {
    /// Open (or create) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = db::open_database(path)?;
        Ok(Self::from_parts(conn, Some(path.to_path_buf())))
    }

    /// An empty store that lives only as long as the handle.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = db::open_memory_database()?;
        Ok(Self::from_parts(conn, None))
    }

    fn from_parts(conn: Connection, path: Option<PathBuf>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(conn)),
            path: path.map(Arc::new),
            resolver: None,
            resolver_timeout: DEFAULT_RESOLVER_TIMEOUT,
        }
    }

    /// Fallback metadata source consulted by [`Store::add_message`] on a cache miss.
    pub fn with_resolver(mut self, resolver: Arc<dyn MetadataResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_resolver_timeout(mut self, timeout: Duration) -> Self {
        self.resolver_timeout = timeout;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref().map(PathBuf::as_path)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|e| StoreError::Task(format!("db lock poisoned: {e}")))
    }

    /// Run `f` against a consistent read snapshot.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Snapshot<'_>) -> Result<T>,
    {
        match self.path.as_deref() {
            Some(path) => {
                let mut conn = db::open_reader(path)?;
                let tx = conn.transaction()?;
                let out = f(&Snapshot::new(&tx));
                // dropping `tx` ends the read transaction
                out
            }
            None => {
                let conn = self.lock()?;
                let out = f(&Snapshot::new(&conn));
                out
            }
        }
    }

    /// Run `f` in a write transaction: committed if `f` returns `Ok`, rolled back
    /// otherwise.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&WriteTx<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&WriteTx::new(&tx))?;
        tx.commit()?;
        Ok(out)
    }

    /// Run a synchronous store operation on the blocking pool.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Store) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    pub fn get(&self, id: &RepositoryId) -> Result<Option<Repository>> {
        self.view(|s| s.repository(id))
    }

    pub fn put(&self, repo: &Repository) -> Result<()> {
        self.update(|tx| tx.put_repository(repo))
    }

    /// Visit every repository in ascending ID order within one snapshot.
    pub fn for_each_repository<F>(&self, f: F) -> Result<()>
    where
        F: FnMut(Repository),
    {
        self.view(|s| s.for_each_repository(f))
    }

    pub fn repositories(&self) -> Result<Vec<Repository>> {
        self.view(|s| s.repositories())
    }

    /// Exclude a repository from ranking. Fails with `NotFound` if it is not
    /// stored locally; repeating the call is a no-op.
    pub fn mark_notified(&self, id: &RepositoryId) -> Result<()> {
        self.update(|tx| tx.mark_notified(id))
    }

    pub fn blacklist(&self) -> Result<BTreeSet<RepositoryId>> {
        self.view(|s| s.blacklist())
    }

    pub fn add_to_blacklist(&self, id: &RepositoryId) -> Result<()> {
        self.update(|tx| tx.add_to_blacklist(id))
    }

    pub fn remove_from_blacklist(&self, id: &RepositoryId) -> Result<bool> {
        self.update(|tx| tx.remove_from_blacklist(id))
    }

    pub fn account_status(&self, username: &str) -> Result<AccountStatus> {
        self.view(|s| s.account_status(username))
    }

    pub fn set_account_status(&self, username: &str, status: &AccountStatus) -> Result<()> {
        self.update(|tx| tx.set_account_status(username, status))
    }

    /// Record a successful send: the account's new status and the repository's
    /// exclusion are committed together or not at all.
    pub fn record_notification(
        &self,
        username: &str,
        status: &AccountStatus,
        id: &RepositoryId,
    ) -> Result<()> {
        self.update(|tx| {
            tx.set_account_status(username, status)?;
            tx.mark_notified(id)
        })
    }

    pub fn meta(&self, key: &str) -> Result<Option<String>> {
        self.view(|s| s.meta(key))
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.update(|tx| tx.set_meta(key, value))
    }

    /// Write a consistent copy of the database to `dest`, which must not exist.
    pub fn backup_to(&self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        match self.path.as_deref() {
            Some(path) => db::backup_to(&db::open_reader(path)?, dest)?,
            None => db::backup_to(&*self.lock()?, dest)?,
        }
        tracing::info!(dest = %dest.display(), "database backup written");
        Ok(())
    }
}
