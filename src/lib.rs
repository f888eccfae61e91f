//! Repository mention tracking with rate-limited per-language announcements.
//!
//! Scuttlebutt watches a stream of social messages for links to code-hosting
//! repositories, caches each repository's metadata and mention history, and
//! periodically announces the most-mentioned repository per language through a
//! set of notification accounts, each at most once per interval.
//!
//! | Partition | Key | Value |
//! |-----------|-----|-------|
//! | `repositories` | `host/owner/name` | Repository JSON (metadata, flag, messages) |
//! | `blacklist` | `host/owner/name` | empty |
//! | `status` | account username | AccountStatus JSON |
//! | `meta` | name | text (e.g. `last_message_id`) |
//!
//! # Architecture
//!
//! - **Storage**: SQLite, one `WITHOUT ROWID` table per partition, single
//!   writer with snapshot readers
//! - **Ingest**: a message source feeds [`store::Store::add_message`], which
//!   dedups mentions and resolves unknown repositories through GitHub
//! - **Ranking**: [`aggregate`] picks the most-mentioned eligible repository per
//!   language; [`schedule`] decides which accounts are due
//! - **Surfaces**: background tasks, a read-only HTTP API, and a CLI
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, partitions, migrations, and health checks
//! - [`store`]: The transactional repository store
//! - [`aggregate`] / [`schedule`]: Ranking and notification timing
//! - [`resolver`] / [`source`] / [`sink`]: External collaborators
//! - [`tasks`] / [`server`]: Poller, notifier, and HTTP surface

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod repository;
pub mod resolver;
pub mod schedule;
pub mod server;
pub mod sink;
pub mod source;
pub mod store;
pub mod tasks;

pub use error::{Result, StoreError};
pub use repository::{AccountStatus, Mention, Message, Repository, RepositoryId};
pub use schedule::Account;
pub use store::{AddOutcome, Store};
