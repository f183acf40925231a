//! SQLite-backed key/value storage.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS kv_store (
//!     key        TEXT PRIMARY KEY,
//!     value      TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! One database file stands in for one browser profile. When checksums are
//! enabled a CRC-32 of the value is stored next to it; a value whose
//! checksum no longer matches is reported as a malformed record so callers
//! fail open instead of trusting it.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, warn};

use crate::config::MemoConfig;
use crate::error::{NumeronError, Result};
use crate::ports::KeyValueStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32fast::hash(data))
}

/// Handle to an open SQLite database holding client storage.
///
/// ```no_run
/// # use numeron_core::storage::SqliteStorage;
/// # use numeron_core::config::MemoConfig;
/// # use numeron_core::ports::KeyValueStore;
/// let storage = SqliteStorage::open("profile.db", &MemoConfig::default())?;
/// storage.set("numeronMemoData", r#"{"3":true}"#)?;
/// # Ok::<(), numeron_core::error::NumeronError>(())
/// ```
pub struct SqliteStorage {
    conn: Connection,
    checksum_enabled: bool,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("db_path", &self.db_path)
            .field("checksum_enabled", &self.checksum_enabled)
            .finish_non_exhaustive()
    }
}

impl SqliteStorage {
    /// Open (or create) a storage database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NumeronError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &MemoConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            checksum = config.checksum_enabled,
            "Memo storage opened"
        );

        Ok(Self {
            conn,
            checksum_enabled: config.checksum_enabled,
            db_path,
        })
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`NumeronError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &MemoConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            checksum_enabled: config.checksum_enabled,
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Return the path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns [`NumeronError::Database`] on SQLite failures.
    pub fn key_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value, checksum FROM kv_store WHERE key = ?1")?;

        let row: Option<(String, Option<String>)> = stmt
            .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((value, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(value.as_bytes());
                if expected != actual {
                    warn!(
                        key,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, possible storage corruption"
                    );
                    return Err(NumeronError::MalformedPersistedState(format!(
                        "checksum mismatch for key {key:?}"
                    )));
                }
            }
        }

        debug!(key, bytes = value.len(), "Loaded storage record");
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let checksum = self
            .checksum_enabled
            .then(|| crc32_hex(value.as_bytes()));
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![key, value, now, checksum],
        )?;

        debug!(key, bytes = value.len(), "Saved storage record");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }
}
