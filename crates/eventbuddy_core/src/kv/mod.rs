//! Key-value persistence collaborator.
//!
//! # Responsibility
//! - Define the minimal string key-value contract the dataset repository
//!   persists through.
//! - Provide an in-memory implementation for tests and embedders.
//!
//! # Invariants
//! - `set` fully overwrites any previous value under the key.
//! - `get` after `set` on the same store returns the written value.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteKvStore;

pub type KvResult<T> = Result<T, KvError>;

/// Failure inside a key-value backend.
#[derive(Debug)]
pub enum KvError {
    Sqlite(rusqlite::Error),
    /// The database was written by a newer build.
    UnsupportedSchema { found: u32, supported: u32 },
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchema { found, supported } => write!(
                f,
                "key-value schema version {found} is newer than supported {supported}"
            ),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// String key-value store used for dataset and identity records.
pub trait KvStore {
    fn get(&self, key: &str) -> KvResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> KvResult<()>;
    fn remove(&mut self, key: &str) -> KvResult<()>;
}

/// Process-local store backed by a `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates one entry without counting it as a write.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Number of `set`/`remove` calls observed so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.entries.remove(key);
        self.writes += 1;
        Ok(())
    }
}

impl<K: KvStore + ?Sized> KvStore for Box<K> {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        (**self).remove(key)
    }
}
