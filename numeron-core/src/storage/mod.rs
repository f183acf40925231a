//! Durable client storage backends for memo records.
//!
//! - [`MemoryStorage`]: shared in-process map, the test and default backend.
//! - [`SqliteStorage`]: file-backed store that survives process restarts.
//!
//! Both are last-writer-wins: two stores writing the same key are not
//! synchronised.

mod sqlite;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::MemoConfig;
use crate::error::{NumeronError, Result};
use crate::ports::KeyValueStore;

pub use sqlite::SqliteStorage;

/// In-process key/value storage.
///
/// Clones share the same map, so a second store built over a clone sees
/// what the first one wrote. That is how tests simulate a page reload.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.inner.write().remove(key).is_some())
    }
}

/// Storage chosen from [`MemoConfig::backend`].
#[derive(Debug)]
pub enum AnyStorage {
    /// In-process map.
    Memory(MemoryStorage),
    /// SQLite file.
    Sqlite(SqliteStorage),
}

impl AnyStorage {
    /// Open the backend named in `config`.
    ///
    /// # Errors
    /// Returns [`NumeronError::Config`] for an unknown backend name, or a
    /// database error if the SQLite file cannot be opened.
    pub fn open(config: &MemoConfig) -> Result<Self> {
        match config.backend.as_str() {
            "memory" => Ok(Self::Memory(MemoryStorage::new())),
            "sqlite" => Ok(Self::Sqlite(SqliteStorage::open(&config.sqlite_path, config)?)),
            other => Err(NumeronError::Config(format!(
                "unknown memo storage backend {other:?} (expected \"memory\" or \"sqlite\")"
            ))),
        }
    }
}

impl KeyValueStore for AnyStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Memory(s) => s.get(key),
            Self::Sqlite(s) => s.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Memory(s) => s.set(key, value),
            Self::Sqlite(s) => s.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<bool> {
        match self {
            Self::Memory(s) => s.remove(key),
            Self::Sqlite(s) => s.remove(key),
        }
    }
}
