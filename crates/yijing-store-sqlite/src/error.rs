//! Error type for `yijing-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("unsupported schema version {0}")]
  SchemaVersion(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
