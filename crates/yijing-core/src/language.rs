//! The closed set of display languages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A supported locale. Anything else falls back to [`Language::default`].
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
  #[default]
  Zh,
  En,
}

impl Language {
  /// The code sent to the backend and persisted in storage.
  pub fn code(self) -> &'static str { self.into() }

  /// Parse a stored code, falling back to the default for unknown input.
  pub fn from_code_or_default(code: &str) -> Self {
    code.trim().parse().unwrap_or_default()
  }

  /// The other language; used by the single-key toggle.
  pub fn toggled(self) -> Self {
    match self {
      Self::Zh => Self::En,
      Self::En => Self::Zh,
    }
  }

  pub fn native_name(self) -> &'static str {
    match self {
      Self::Zh => "中文",
      Self::En => "English",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes() {
    assert_eq!(Language::Zh.code(), "zh");
    assert_eq!(Language::En.to_string(), "en");
  }

  #[test]
  fn unknown_codes_fall_back() {
    assert_eq!(Language::from_code_or_default("en"), Language::En);
    assert_eq!(Language::from_code_or_default("fr"), Language::Zh);
    assert_eq!(Language::from_code_or_default(""), Language::Zh);
  }

  #[test]
  fn toggle() {
    assert_eq!(Language::Zh.toggled(), Language::En);
    assert_eq!(Language::En.toggled().toggled(), Language::En);
  }
}
