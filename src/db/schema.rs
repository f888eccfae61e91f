//! SQL DDL for the key-value partitions.
//!
//! Each partition (`repositories`, `blacklist`, `status`, `meta`) is a
//! `WITHOUT ROWID` table keyed by text, so a plain `ORDER BY key` walks it in
//! byte order. `schema_meta` tracks the schema version. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Repository records, JSON-encoded
CREATE TABLE IF NOT EXISTS repositories (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
) WITHOUT ROWID;

-- Excluded repository IDs; value is an empty presence marker
CREATE TABLE IF NOT EXISTS blacklist (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL DEFAULT ''
) WITHOUT ROWID;

-- Per-account notification status, JSON-encoded
CREATE TABLE IF NOT EXISTS status (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
) WITHOUT ROWID;

-- Free-form application metadata (e.g. last seen message ID)
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
) WITHOUT ROWID;

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all partitions. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
