//! SQLite backend for the workbench's key/value storage port.
//!
//! A single `kv` table holds every key; each read or write is one statement,
//! so calls are atomic without explicit transactions.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStorage;
