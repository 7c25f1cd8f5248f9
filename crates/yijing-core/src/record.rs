//! History records: the compact summaries persisted after an explicit save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  divination::{ChangeInfo, DivinationResult},
  hexagram::Hexagram,
};

/// The identifying fields of a hexagram, without texts or lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexagramSummary {
  pub number:       u8,
  pub name:         String,
  pub chinese_name: String,
  pub symbol:       String,
}

impl From<&Hexagram> for HexagramSummary {
  fn from(h: &Hexagram) -> Self {
    Self {
      number:       h.number,
      name:         h.name.clone(),
      chinese_name: h.chinese_name.clone(),
      symbol:       h.symbol.clone(),
    }
  }
}

impl HexagramSummary {
  /// Expand back into a hexagram with no lines or texts.
  pub fn to_hexagram(&self) -> Hexagram {
    Hexagram {
      number:          self.number,
      name:            self.name.clone(),
      chinese_name:    self.chinese_name.clone(),
      symbol:          self.symbol.clone(),
      upper_trigram:   String::new(),
      lower_trigram:   String::new(),
      king_wen:        None,
      image:           None,
      interpretations: None,
      lines:           Vec::new(),
    }
  }
}

/// One saved divination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivinationRecord {
  pub id:                   String,
  pub question:             String,
  pub original_hexagram:    HexagramSummary,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub changed_hexagram:     Option<HexagramSummary>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub diviner_name:         Option<String>,
  pub timestamp:            DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:                Option<String>,
  #[serde(default)]
  pub changing_lines_count: usize,
}

impl DivinationRecord {
  /// Summarise `result`; the id is the save time in milliseconds.
  pub fn from_result(result: &DivinationResult, saved_at: DateTime<Utc>) -> Self {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_owned());
    Self {
      id:                   saved_at.timestamp_millis().to_string(),
      question:             result.question.clone(),
      original_hexagram:    HexagramSummary::from(&result.original_hexagram),
      changed_hexagram:     result.changed_hexagram.as_ref().map(HexagramSummary::from),
      diviner_name:         non_empty(&result.diviner_name),
      timestamp:            result.timestamp,
      notes:                non_empty(&result.notes),
      changing_lines_count: result.lines.iter().filter(|l| l.changing).count(),
    }
  }

  /// Rebuild a viewable result. Records keep no lines, so the result has
  /// none either and `interpretation` is the caller's placeholder text.
  pub fn to_result(&self, interpretation: String) -> DivinationResult {
    DivinationResult {
      question:          self.question.clone(),
      timestamp:         self.timestamp,
      original_hexagram: self.original_hexagram.to_hexagram(),
      changed_hexagram:  self.changed_hexagram.as_ref().map(HexagramSummary::to_hexagram),
      mutual_hexagram:   None,
      lines:             Vec::new(),
      interpretation,
      diviner_name:      self.diviner_name.clone().unwrap_or_default(),
      notes:             self.notes.clone().unwrap_or_default(),
      change_info:       ChangeInfo {
        has_changes:    self.changed_hexagram.is_some(),
        changing_lines: Vec::new(),
      },
    }
  }
}
