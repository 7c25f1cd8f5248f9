//! Najia (Six-Lines) analysis payload.
//!
//! The backend computes all of it; the workbench only renders it. Field
//! names stay snake_case to match the wire format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hexagram::LineKind;

/// Stem-branch encoding of the divination moment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanZhiTime {
  pub year_gz:  String,
  pub month_gz: String,
  pub day_gz:   String,
  pub hour_gz:  String,
  /// Void branches (旬空) of the current decade.
  #[serde(default)]
  pub xunkong:  Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NajiaLineInfo {
  pub position: u8,
  pub yao_type: LineKind,
  #[serde(default)]
  pub changing: bool,
  /// Stem-branch attached to the line.
  #[serde(default)]
  pub najia:    String,
  /// Five-element phase.
  #[serde(default)]
  pub wuxing:   String,
  /// Kinship role.
  #[serde(default)]
  pub liuqin:   String,
  /// Six-spirit.
  #[serde(default)]
  pub liushen:  String,
  #[serde(default)]
  pub shi_yao:  bool,
  #[serde(default)]
  pub ying_yao: bool,
  /// Hidden spirit, when the kinship role is missing from the hexagram.
  #[serde(default)]
  pub fushen:   Option<String>,
  #[serde(default)]
  pub xunkong:  bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NajiaHexagramInfo {
  pub number:      u8,
  pub name:        String,
  pub palace:      String,
  pub wuxing:      String,
  pub lines:       Vec<NajiaLineInfo>,
  pub shi_yao_pos: u8,
  pub ying_yao_pos: u8,
}

impl NajiaHexagramInfo {
  /// The world line (世爻).
  pub fn world_line(&self) -> Option<&NajiaLineInfo> {
    self.lines.iter().find(|l| l.position == self.shi_yao_pos)
  }

  /// The response line (应爻).
  pub fn response_line(&self) -> Option<&NajiaLineInfo> {
    self.lines.iter().find(|l| l.position == self.ying_yao_pos)
  }

  /// Lines whose branch is void in the current decade.
  pub fn void_lines(&self) -> impl Iterator<Item = &NajiaLineInfo> {
    self.lines.iter().filter(|l| l.xunkong)
  }

  /// Lines from top to bottom, the order they are traditionally listed in.
  pub fn lines_top_down(&self) -> impl Iterator<Item = &NajiaLineInfo> {
    self.lines.iter().rev()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NajiaDivinationResult {
  #[serde(default)]
  pub question:                   String,
  pub divination_time:            String,
  pub ganzhi_time:                GanZhiTime,
  pub original_hexagram:          NajiaHexagramInfo,
  #[serde(default)]
  pub changed_hexagram:           Option<NajiaHexagramInfo>,
  #[serde(default)]
  pub traditional_interpretation: String,
  #[serde(default)]
  pub detailed_analysis:          BTreeMap<String, serde_json::Value>,
}
