//! Error types for `yijing-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("line value {0} is not a classical line encoding (6-9)")]
  InvalidLineValue(u8),

  #[error("expected 6 lines, got {0}")]
  LineCount(usize),

  #[error("line position {0} is outside 1..=6")]
  LinePosition(u8),

  #[error("unknown trigram encoding: {0:?}")]
  UnknownTrigram(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
