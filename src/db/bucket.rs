//! Byte-ordered key/value access to a single partition.
//!
//! Works on any `&Connection`, including a `Transaction` through deref, so the
//! caller decides the transactional scope.

use rusqlite::{params, Connection, OptionalExtension};

/// The named partitions of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Repositories,
    Blacklist,
    Status,
    Meta,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Repositories,
        Bucket::Blacklist,
        Bucket::Status,
        Bucket::Meta,
    ];

    /// Table name backing this partition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repositories => "repositories",
            Self::Blacklist => "blacklist",
            Self::Status => "status",
            Self::Meta => "meta",
        }
    }

    pub fn get(&self, conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
        conn.query_row(
            &format!("SELECT value FROM {} WHERE key = ?1", self.as_str()),
            params![key],
            |row| row.get(0),
        )
        .optional()
    }

    pub fn contains(&self, conn: &Connection, key: &str) -> rusqlite::Result<bool> {
        conn.query_row(
            &format!("SELECT COUNT(*) > 0 FROM {} WHERE key = ?1", self.as_str()),
            params![key],
            |row| row.get(0),
        )
    }

    /// Insert or overwrite.
    pub fn put(&self, conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO {} (key, value) VALUES (?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                self.as_str()
            ),
            params![key, value],
        )?;
        Ok(())
    }

    /// Returns `true` if a key was removed.
    pub fn delete(&self, conn: &Connection, key: &str) -> rusqlite::Result<bool> {
        let rows = conn.execute(
            &format!("DELETE FROM {} WHERE key = ?1", self.as_str()),
            params![key],
        )?;
        Ok(rows > 0)
    }

    /// Visit every entry in ascending key order.
    pub fn for_each<F>(&self, conn: &Connection, mut f: F) -> rusqlite::Result<()>
    where
        F: FnMut(String, String),
    {
        let mut stmt = conn.prepare(&format!(
            "SELECT key, value FROM {} ORDER BY key",
            self.as_str()
        ))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            f(row.get(0)?, row.get(1)?);
        }
        Ok(())
    }

    /// All keys in ascending order.
    pub fn keys(&self, conn: &Connection) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("SELECT key FROM {} ORDER BY key", self.as_str()))?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    pub fn count(&self, conn: &Connection) -> rusqlite::Result<u64> {
        let n: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.as_str()),
            [],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
