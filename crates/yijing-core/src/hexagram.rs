//! Lines and hexagrams: the values the backend returns and the workbench
//! renders.
//!
//! Lines are always ordered bottom to top: position 1 is the bottom line.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  trigram::{KingWen, Trigram},
};

// ─── Line kinds and values ───────────────────────────────────────────────────

/// Polarity of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
  Yang,
  Yin,
}

impl LineKind {
  pub fn is_yang(self) -> bool { matches!(self, Self::Yang) }

  pub fn flipped(self) -> Self {
    match self {
      Self::Yang => Self::Yin,
      Self::Yin => Self::Yang,
    }
  }
}

/// A classical line encoding as produced by coins or yarrow stalks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LineValue {
  /// 6: old yin, changing.
  OldYin,
  /// 7: young yang, stable.
  YoungYang,
  /// 8: young yin, stable.
  YoungYin,
  /// 9: old yang, changing.
  OldYang,
}

impl LineValue {
  pub fn kind(self) -> LineKind {
    match self {
      Self::YoungYang | Self::OldYang => LineKind::Yang,
      Self::OldYin | Self::YoungYin => LineKind::Yin,
    }
  }

  pub fn is_changing(self) -> bool {
    matches!(self, Self::OldYin | Self::OldYang)
  }

  pub fn from_line(kind: LineKind, changing: bool) -> Self {
    match (kind, changing) {
      (LineKind::Yang, false) => Self::YoungYang,
      (LineKind::Yang, true) => Self::OldYang,
      (LineKind::Yin, false) => Self::YoungYin,
      (LineKind::Yin, true) => Self::OldYin,
    }
  }
}

impl TryFrom<u8> for LineValue {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> {
    match value {
      6 => Ok(Self::OldYin),
      7 => Ok(Self::YoungYang),
      8 => Ok(Self::YoungYin),
      9 => Ok(Self::OldYang),
      other => Err(Error::InvalidLineValue(other)),
    }
  }
}

impl From<LineValue> for u8 {
  fn from(value: LineValue) -> Self {
    match value {
      LineValue::OldYin => 6,
      LineValue::YoungYang => 7,
      LineValue::YoungYin => 8,
      LineValue::OldYang => 9,
    }
  }
}

// ─── Text ────────────────────────────────────────────────────────────────────

/// An original classical text with a plain-language explanation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextExplanation {
  #[serde(default)]
  pub text:        String,
  #[serde(default)]
  pub explanation: String,
}

impl TextExplanation {
  pub fn is_empty(&self) -> bool {
    self.text.is_empty() && self.explanation.is_empty()
  }
}

// ─── Line ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
  pub position:        u8,
  #[serde(rename = "type")]
  pub kind:            LineKind,
  #[serde(default)]
  pub changing:        bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text:            Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub explanation:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image:           Option<TextExplanation>,
  /// Per-school readings, passed through untouched.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interpretations: Option<serde_json::Value>,
}

impl Line {
  /// A bare line with no text attached.
  pub fn new(position: u8, kind: LineKind, changing: bool) -> Self {
    Self {
      position,
      kind,
      changing,
      text: None,
      explanation: None,
      image: None,
      interpretations: None,
    }
  }

  pub fn from_value(position: u8, value: LineValue) -> Self {
    Self::new(position, value.kind(), value.is_changing())
  }

  pub fn value(&self) -> LineValue { LineValue::from_line(self.kind, self.changing) }

  /// Line text, if the backend sent a non-empty one.
  pub fn text(&self) -> Option<&str> {
    self.text.as_deref().filter(|t| !t.is_empty())
  }
}

// ─── Hexagram ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hexagram {
  pub number:          u8,
  pub name:            String,
  pub chinese_name:    String,
  #[serde(default)]
  pub symbol:          String,
  #[serde(default)]
  pub upper_trigram:   String,
  #[serde(default)]
  pub lower_trigram:   String,
  /// The judgment (卦辞).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub king_wen:        Option<TextExplanation>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image:           Option<TextExplanation>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interpretations: Option<serde_json::Value>,
  #[serde(default)]
  pub lines:           Vec<Line>,
}

impl Hexagram {
  /// Build a bare hexagram from six bottom-to-top lines using the King Wen
  /// lookup. Texts are left empty.
  pub fn from_lines(lines: Vec<Line>) -> Result<Self> {
    if lines.len() != 6 {
      return Err(Error::LineCount(lines.len()));
    }
    if let Some(bad) = lines
      .iter()
      .enumerate()
      .find(|(i, l)| usize::from(l.position) != i + 1)
    {
      return Err(Error::LinePosition(bad.1.position));
    }
    let lower = Trigram::from_lines([lines[0].kind, lines[1].kind, lines[2].kind]);
    let upper = Trigram::from_lines([lines[3].kind, lines[4].kind, lines[5].kind]);
    let kw = KingWen::lookup(upper, lower);
    Ok(Self {
      number:          kw.number,
      name:            kw.pinyin.to_owned(),
      chinese_name:    kw.chinese_name.to_owned(),
      symbol:          kw.symbol().to_string(),
      upper_trigram:   upper.bits(),
      lower_trigram:   lower.bits(),
      king_wen:        None,
      image:           None,
      interpretations: None,
      lines,
    })
  }

  /// Positions (1-based) of the changing lines.
  pub fn changing_positions(&self) -> Vec<u8> {
    self
      .lines
      .iter()
      .filter(|l| l.changing)
      .map(|l| l.position)
      .collect()
  }

  /// The hexagram reached by flipping every changing line, or `None` when
  /// nothing changes or the hexagram has no full set of lines.
  pub fn transformed(&self) -> Option<Self> {
    if self.lines.len() != 6 || !self.lines.iter().any(|l| l.changing) {
      return None;
    }
    let lines = self
      .lines
      .iter()
      .map(|l| {
        let kind = if l.changing { l.kind.flipped() } else { l.kind };
        Line::new(l.position, kind, false)
      })
      .collect();
    Self::from_lines(lines).ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lines(values: [u8; 6]) -> Vec<Line> {
    values
      .iter()
      .enumerate()
      .map(|(i, v)| Line::from_value(i as u8 + 1, LineValue::try_from(*v).unwrap()))
      .collect()
  }

  #[test]
  fn line_value_rejects_out_of_range() {
    assert!(matches!(LineValue::try_from(5), Err(Error::InvalidLineValue(5))));
    assert!(LineValue::try_from(10).is_err());
  }

  #[test]
  fn line_value_semantics() {
    assert!(LineValue::OldYin.is_changing());
    assert!(!LineValue::YoungYang.is_changing());
    assert_eq!(LineValue::OldYang.kind(), LineKind::Yang);
    assert_eq!(LineValue::from_line(LineKind::Yin, true), LineValue::OldYin);
  }

  #[test]
  fn line_deserialises_backend_shape() {
    let json = r#"{"position":1,"type":"yang","changing":false,"text":"初九。潜龙勿用。",
      "explanation":"","image":{"text":"潜龙勿用，阳在下也。","explanation":""},
      "changes_to":{"name":""}}"#;
    let line: Line = serde_json::from_str(json).unwrap();
    assert_eq!(line.kind, LineKind::Yang);
    assert_eq!(line.text(), Some("初九。潜龙勿用。"));
    assert!(line.explanation.as_deref().is_some_and(str::is_empty));
  }

  #[test]
  fn hexagram_uses_camel_case_on_the_wire() {
    let hex = Hexagram::from_lines(lines([7, 7, 7, 7, 7, 7])).unwrap();
    let json = serde_json::to_value(&hex).unwrap();
    assert_eq!(json["chineseName"], "乾");
    assert_eq!(json["upperTrigram"], "111");
    assert!(json.get("kingWen").is_none());
  }

  #[test]
  fn from_lines_looks_up_king_wen() {
    // Fire below, water above.
    let hex = Hexagram::from_lines(lines([7, 8, 7, 8, 7, 8])).unwrap();
    assert_eq!(hex.number, 63);
    assert_eq!(hex.lower_trigram, "101");
    assert_eq!(hex.upper_trigram, "010");
  }

  #[test]
  fn from_lines_requires_six_ordered_lines() {
    let mut ls = lines([7, 7, 7, 7, 7, 7]);
    ls.pop();
    assert!(matches!(Hexagram::from_lines(ls), Err(Error::LineCount(5))));

    let mut ls = lines([7, 7, 7, 7, 7, 7]);
    ls.swap(0, 1);
    assert!(matches!(Hexagram::from_lines(ls), Err(Error::LinePosition(2))));
  }

  #[test]
  fn transformed_flips_changing_lines() {
    // Old yang at the bottom of Qian turns it into Gou (44).
    let hex = Hexagram::from_lines(lines([9, 7, 7, 7, 7, 7])).unwrap();
    assert_eq!(hex.changing_positions(), vec![1]);
    let changed = hex.transformed().unwrap();
    assert_eq!(changed.number, 44);
    assert!(changed.changing_positions().is_empty());
  }

  #[test]
  fn transformed_is_none_without_changes() {
    let hex = Hexagram::from_lines(lines([7, 8, 7, 8, 7, 8])).unwrap();
    assert!(hex.transformed().is_none());
  }
}
