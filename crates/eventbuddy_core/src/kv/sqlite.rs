//! SQLite-backed key-value store.
//!
//! # Invariants
//! - Entries live in the `kv_entries` table; no entry is read or written
//!   before the schema upgrade succeeds.
//! - `set` is an upsert; the previous value is replaced, never merged.

use super::schema::upgrade;
use super::{KvResult, KvStore};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Key-value store owning one SQLite connection.
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Opens a database file, creating and upgrading it as needed.
    ///
    /// # Side effects
    /// - Emits `kv_open` log lines with duration and status.
    pub fn open(path: impl AsRef<Path>) -> KvResult<Self> {
        Self::bootstrap("file", || Connection::open(path))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> KvResult<Self> {
        Self::bootstrap("memory", Connection::open_in_memory)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn bootstrap(
        mode: &str,
        connect: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> KvResult<Self> {
        let started_at = Instant::now();
        match connect_and_upgrade(connect) {
            Ok(conn) => {
                info!(
                    "event=kv_open module=kv status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self { conn })
            }
            Err(err) => {
                error!(
                    "event=kv_open module=kv status=error mode={mode} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

fn connect_and_upgrade(
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> KvResult<Connection> {
    let mut conn = connect()?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    upgrade(&mut conn)?;
    Ok(conn)
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}
