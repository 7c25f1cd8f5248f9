//! Hexagrams, divination results and the ports of the Yijing workbench.
//!
//! No HTTP or database code lives here. The remote service is reached
//! through [`backend::DivinationBackend`] and local persistence through
//! [`storage::Storage`].

pub mod backend;
pub mod chat;
pub mod divination;
pub mod error;
pub mod hexagram;
pub mod language;
pub mod method;
pub mod najia;
pub mod record;
pub mod storage;
pub mod trigram;

pub use error::{Error, Result};
