//! Saved divinations, kept as one JSON array in the key/value store.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use yijing_core::{
  record::DivinationRecord,
  storage::{HISTORY_KEY, Storage},
};

use crate::{Error, Result};

/// Records beyond this many are dropped, oldest first.
pub const HISTORY_LIMIT: usize = 100;

pub struct HistoryStore<S> {
  storage: S,
}

impl<S: Storage> HistoryStore<S> {
  pub fn new(storage: S) -> Self { Self { storage } }

  /// All records, newest first. Corrupt data reads as empty; a failed read
  /// is an error.
  pub fn load(&self) -> Result<Vec<DivinationRecord>> {
    let Some(raw) = self.storage.get(HISTORY_KEY).map_err(Error::storage)? else {
      return Ok(Vec::new());
    };
    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
      tracing::warn!(error = %e, "stored history is corrupt; treating as empty");
      Vec::new()
    }))
  }

  /// Like [`load`](Self::load), but a failed read also shows as empty.
  pub fn list(&self) -> Vec<DivinationRecord> {
    self.load().unwrap_or_else(|e| {
      tracing::warn!(error = %e, "could not read history");
      Vec::new()
    })
  }

  pub fn get(&self, id: &str) -> Option<DivinationRecord> {
    self.list().into_iter().find(|r| r.id == id)
  }

  /// Prepend `record`, keeping at most [`HISTORY_LIMIT`].
  pub fn append(&self, record: DivinationRecord) -> Result<()> {
    let mut records = self.load()?;
    records.insert(0, record);
    records.truncate(HISTORY_LIMIT);
    self.write(&records)
  }

  pub fn clear(&self) -> Result<()> {
    self.storage.remove(HISTORY_KEY).map_err(Error::storage)
  }

  /// The whole list as pretty JSON.
  pub fn export_json(&self) -> Result<String> {
    Ok(serde_json::to_string_pretty(&self.load()?)?)
  }

  /// Write [`export_json`](Self::export_json) to
  /// `dir/divination_history_<date>.json` and return the path.
  pub fn export_to(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    let path = dir.join(format!("divination_history_{}.json", date.format("%Y-%m-%d")));
    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, self.export_json()?)?;
    tracing::info!(path = %path.display(), "history exported");
    Ok(path)
  }

  fn write(&self, records: &[DivinationRecord]) -> Result<()> {
    let json = serde_json::to_string(records)?;
    self.storage.set(HISTORY_KEY, &json).map_err(Error::storage)
  }
}
