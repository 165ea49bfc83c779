//! Schema steps for the SQLite key-value table.
//!
//! # Invariants
//! - Step versions are strictly increasing, starting at 1.
//! - The applied version is mirrored to `PRAGMA user_version`.
//! - A database written by a newer build is never touched.

use super::{KvError, KvResult};
use log::info;
use rusqlite::Connection;

/// `(version, sql)` pairs applied in order.
const STEPS: &[(u32, &str)] = &[(1, include_str!("schema/0001_kv_entries.sql"))];

/// Highest schema version this build can read and write.
pub fn supported_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to [`supported_version`] inside one transaction.
///
/// # Errors
/// - `UnsupportedSchema` when the file already carries a newer version.
/// - `Sqlite` when a step fails; the file keeps its previous version.
pub(crate) fn upgrade(conn: &mut Connection) -> KvResult<()> {
    let found = stored_version(conn)?;
    let supported = supported_version();
    if found > supported {
        return Err(KvError::UnsupportedSchema { found, supported });
    }

    let pending = STEPS.iter().filter(|(version, _)| *version > found);
    let tx = conn.transaction()?;
    let mut applied = 0usize;
    for (version, sql) in pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        applied += 1;
    }
    tx.commit()?;

    if applied > 0 {
        info!(
            "event=kv_schema_upgrade module=kv status=ok from_version={found} to_version={supported} steps={applied}"
        );
    }
    Ok(())
}

/// Version currently recorded in the database file.
pub fn stored_version(conn: &Connection) -> KvResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
