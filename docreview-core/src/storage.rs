//! Physical key/value storage behind the settings store.
//!
//! [`Storage`] is the browser-storage shaped seam: string keys, string values.
//! Two backends exist: [`SqliteStorage`] for the real application and
//! [`MemoryStorage`] for tests and as a fallback when the database is
//! unavailable.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};

use crate::error::StorageError;

/// String key/value store.
///
/// Implementations report every failure as a [`StorageError`]; deciding
/// whether a failure matters is the caller's job.
pub trait Storage: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    /// All keys currently present, in ascending order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

// ---------------------------------------------------------------------------
// SQLite backend
// ---------------------------------------------------------------------------

/// SQLite-backed storage using the `kv` table from [`crate::schema`].
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`, configures WAL mode and
    /// applies schema migrations.
    ///
    /// `busy_timeout` is set through the `Connection` method rather than a
    /// PRAGMA string so it takes effect regardless of pragma caching.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Sqlite` if the file cannot be opened, WAL
    /// configuration fails, or schema DDL fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let mut conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        crate::schema::migrate(&mut conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens a private in-memory database. Nothing survives the value.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let mut conn = Connection::open_in_memory()?;
        crate::schema::migrate(&mut conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&conn)?)
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_conn(|db| {
            db.query_row("SELECT value FROM kv WHERE key = ?1", [key], |r| r.get(0))
                .optional()
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_conn(|db| {
            db.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, value],
            )?;
            Ok(())
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.with_conn(|db| {
            db.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            Ok(())
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.with_conn(|db| {
            let mut stmt = db.prepare("SELECT key FROM kv ORDER BY key")?;
            let rows = stmt
                .query_map([], |r| r.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Shared in-memory map. Clones share the same contents.
///
/// An optional byte quota (sum of key and value lengths) makes writes fail
/// the way a full browser store does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once `bytes` would be exceeded.
    pub fn with_quota(bytes: usize) -> Self {
        Self { items: Arc::default(), quota: Some(bytes) }
    }

    fn used_bytes(items: &BTreeMap<String, String>, skip: &str) -> usize {
        items
            .iter()
            .filter(|(k, _)| k.as_str() != skip)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        if let Some(quota) = self.quota {
            let used = Self::used_bytes(&items, key);
            let needed = key.len() + value.len();
            if used + needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    available: quota.saturating_sub(used),
                });
            }
        }
        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(items.keys().cloned().collect())
    }
}
