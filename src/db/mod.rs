//! SQLite-backed key-value engine: opening, schema, migrations, health checks.

pub mod bucket;
pub mod migrations;
pub mod schema;

pub use bucket::Bucket;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open (or create) the database at the given path with schema initialized and
/// migrations applied. This is the single writer connection.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    // WAL lets readers keep a snapshot while the writer commits
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a read-only connection to an existing database, for snapshot reads.
pub fn open_reader(path: impl AsRef<Path>) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI,
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Open an in-memory database with schema and migrations applied.
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Write a consistent copy of the database to `dest` (which must not exist).
pub fn backup_to(conn: &Connection, dest: impl AsRef<Path>) -> rusqlite::Result<()> {
    let dest = dest.as_ref().to_string_lossy().into_owned();
    conn.execute("VACUUM INTO ?1", [dest])?;
    Ok(())
}

/// Result of [`check_database_health`].
#[derive(Debug)]
pub struct HealthReport {
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub schema_version: u32,
    pub repository_count: u64,
    pub blacklist_count: u64,
    pub status_count: u64,
    pub meta_count: u64,
}

/// Run `PRAGMA integrity_check` and gather per-partition row counts.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let integrity: Vec<String> = conn
        .prepare("PRAGMA integrity_check")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let integrity_ok = integrity.len() == 1 && integrity[0] == "ok";

    Ok(HealthReport {
        integrity_ok,
        integrity_details: integrity.join("; "),
        schema_version: migrations::get_schema_version(conn)?,
        repository_count: Bucket::Repositories.count(conn)?,
        blacklist_count: Bucket::Blacklist.count(conn)?,
        status_count: Bucket::Status.count(conn)?,
        meta_count: Bucket::Meta.count(conn)?,
    })
}
