//! Layered settings: optional TOML file, then `YIJING_*` environment
//! variables. CLI flags are applied on top by the binary.

use std::{path::{Path, PathBuf}, time::Duration};

use serde::Deserialize;
use yijing_core::language::Language;

/// Runtime settings, deserialised with the `config` crate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Base URL of the divination backend.
  pub base_url:             String,
  /// Language used when none has been persisted yet.
  pub language:             Language,
  pub data_dir:             Option<PathBuf>,
  /// Where downloads and history exports are written.
  pub export_dir:           Option<PathBuf>,
  /// Request the najia analysis alongside each divination.
  pub include_najia:        bool,
  pub request_timeout_secs: u64,
  /// Artificial delay before each divination call, in milliseconds.
  pub latency_min_ms:       u64,
  pub latency_max_ms:       u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      base_url:             "http://localhost:8000".into(),
      language:             Language::default(),
      data_dir:             None,
      export_dir:           None,
      include_najia:        false,
      request_timeout_secs: 60,
      latency_min_ms:       800,
      latency_max_ms:       2000,
    }
  }
}

/// Inclusive bounds of the simulated latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
  pub min: Duration,
  pub max: Duration,
}

impl Latency {
  pub const NONE: Self = Self { min: Duration::ZERO, max: Duration::ZERO };
}

impl Settings {
  /// Read `file` (when given) and the `YIJING_` environment.
  pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = file {
      builder = builder.add_source(config::File::from(path).required(true));
    }
    builder
      .add_source(config::Environment::with_prefix("YIJING"))
      .build()?
      .try_deserialize()
  }

  pub fn data_dir(&self) -> PathBuf {
    self.data_dir.clone().unwrap_or_else(|| {
      dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yijing")
    })
  }

  pub fn export_dir(&self) -> PathBuf {
    self.export_dir.clone().unwrap_or_else(|| self.data_dir())
  }

  pub fn database_path(&self) -> PathBuf { self.data_dir().join("yijing.db") }

  pub fn log_path(&self) -> PathBuf { self.data_dir().join("yijing.log") }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs.max(1))
  }

  /// Latency bounds with `min <= max` enforced.
  pub fn latency(&self) -> Latency {
    let a = Duration::from_millis(self.latency_min_ms);
    let b = Duration::from_millis(self.latency_max_ms);
    Latency { min: a.min(b), max: a.max(b) }
  }
}
