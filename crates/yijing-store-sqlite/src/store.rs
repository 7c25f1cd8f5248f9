//! [`SqliteStorage`]: the SQLite implementation of [`Storage`].

use std::{
  path::Path,
  sync::{Mutex, MutexGuard},
};

use rusqlite::{Connection, OptionalExtension as _};
use yijing_core::storage::Storage;

use crate::{
  Error, Result,
  schema::{SCHEMA, SCHEMA_VERSION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Key/value storage backed by a single SQLite file.
///
/// The connection sits behind a mutex so the storage can be shared between
/// the UI and background tasks.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) a store at `path` and run schema initialisation.
  /// Missing parent directories are created.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    Self::init(Connection::open(path)?)
  }

  /// Open an in-memory store for tests.
  pub fn open_in_memory() -> Result<Self> { Self::init(Connection::open_in_memory()?) }

  fn init(conn: Connection) -> Result<Self> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if version > SCHEMA_VERSION {
      return Err(Error::SchemaVersion(version));
    }
    conn.execute_batch(SCHEMA)?;
    tracing::debug!(version = SCHEMA_VERSION, "storage schema ready");
    Ok(Self { conn: Mutex::new(conn) })
  }

  fn conn(&self) -> MutexGuard<'_, Connection> {
    // The connection holds no invariant a panicking writer could break.
    self.conn.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// All stored keys, sorted.
  #[cfg(test)]
  pub(crate) fn keys(&self) -> Result<Vec<String>> {
    let conn = self.conn();
    let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
    let keys = stmt
      .query_map([], |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(keys)
  }
}

// ─── Storage impl ────────────────────────────────────────────────────────────

impl Storage for SqliteStorage {
  type Error = Error;

  fn get(&self, key: &str) -> Result<Option<String>> {
    let value = self
      .conn()
      .query_row(
        "SELECT value FROM kv WHERE key = ?1",
        rusqlite::params![key],
        |r| r.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    self.conn().execute(
      "INSERT INTO kv (key, value) VALUES (?1, ?2)
       ON CONFLICT(key) DO UPDATE SET
         value = excluded.value,
         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
      rusqlite::params![key, value],
    )?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    self
      .conn()
      .execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
    Ok(())
  }
}
