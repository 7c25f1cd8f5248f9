//! Terminal workbench for Yijing divination.
//!
//! The binary (`yijing`) is a thin shell around [`app::App`]; everything
//! stateful lives in the modules below so it can be exercised without a
//! terminal.

pub mod app;
pub mod chat;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod history;
pub mod i18n;
pub mod notice;
pub mod report;
pub mod ui;
pub mod workbench;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
