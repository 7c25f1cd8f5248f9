//! The `Storage` trait: a small synchronous key/value port for the settings
//! and history the workbench keeps between runs.
//!
//! Values are opaque strings (JSON in practice). Implemented by
//! `yijing-store-sqlite`; [`MemoryStorage`] serves tests and ephemeral runs.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{Arc, Mutex},
};

/// Key holding the JSON array of saved divination records.
pub const HISTORY_KEY: &str = "divinationHistory";

/// Key holding the selected language code.
pub const LANGUAGE_KEY: &str = "language";

/// Abstraction over a persistent string key/value store.
///
/// Every call is a single atomic read or write.
pub trait Storage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

  fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

  fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
  type Error = S::Error;

  fn get(&self, key: &str) -> Result<Option<String>, Self::Error> { (**self).get(key) }

  fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
    (**self).set(key, value)
  }

  fn remove(&self, key: &str) -> Result<(), Self::Error> { (**self).remove(key) }
}

/// In-process storage; contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self { Self::default() }

  fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
    // A poisoned map is still a valid map.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl Storage for MemoryStorage {
  type Error = Infallible;

  fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
    Ok(self.entries().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
    self.entries().insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), Self::Error> {
    self.entries().remove(key);
    Ok(())
  }
}
