//! Divination results: the backend wire shape, its normalised form, the
//! mutual hexagram, and the offline fallback.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  hexagram::{Hexagram, Line, LineKind, TextExplanation},
  najia::NajiaDivinationResult,
  trigram::{KingWen, Trigram},
};

// ─── Wire shape ──────────────────────────────────────────────────────────────

/// Body returned by both divination endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivinationResponse {
  pub question:          String,
  pub original_hexagram: Hexagram,
  #[serde(default)]
  pub changed_hexagram:  Option<Hexagram>,
  #[serde(default)]
  pub lines:             Vec<Line>,
  pub timestamp:         String,
  #[serde(default)]
  pub interpretation:    String,
  #[serde(default)]
  pub najia:             Option<NajiaDivinationResult>,
}

// ─── Normalised result ───────────────────────────────────────────────────────

/// Which lines changed, derived from the line array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeInfo {
  pub has_changes:    bool,
  pub changing_lines: Vec<u8>,
}

impl ChangeInfo {
  pub fn from_lines(lines: &[Line]) -> Self {
    let changing_lines: Vec<u8> = lines
      .iter()
      .filter(|l| l.changing)
      .map(|l| l.position)
      .collect();
    Self { has_changes: !changing_lines.is_empty(), changing_lines }
  }
}

/// The divination currently shown by the workbench.
///
/// Replaced wholesale on every divination; only `notes` and `diviner_name`
/// are edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivinationResult {
  pub question:          String,
  pub timestamp:         DateTime<Utc>,
  pub original_hexagram: Hexagram,
  pub changed_hexagram:  Option<Hexagram>,
  pub mutual_hexagram:   Option<Hexagram>,
  pub lines:             Vec<Line>,
  pub interpretation:    String,
  pub diviner_name:      String,
  pub notes:             String,
  pub change_info:       ChangeInfo,
}

impl DivinationResult {
  /// Normalise a backend response.
  ///
  /// The changed hexagram is kept only when a line actually changes; if the
  /// backend omitted it in that case it is derived locally.
  pub fn from_response(
    response: DivinationResponse,
    diviner_name: String,
    notes: String,
  ) -> Self {
    let DivinationResponse {
      question,
      mut original_hexagram,
      changed_hexagram,
      lines,
      timestamp,
      interpretation,
      ..
    } = response;

    if original_hexagram.lines.is_empty() && lines.len() == 6 {
      original_hexagram.lines = lines.clone();
    }

    let change_info = ChangeInfo::from_lines(&lines);
    let changed_hexagram = if change_info.has_changes {
      changed_hexagram.or_else(|| original_hexagram.transformed())
    } else {
      None
    };
    let mutual_hexagram = (original_hexagram.lines.len() == 6)
      .then(|| calculate_mutual_hexagram(&original_hexagram));

    Self {
      question,
      timestamp: parse_timestamp(&timestamp).unwrap_or_else(Utc::now),
      original_hexagram,
      changed_hexagram,
      mutual_hexagram,
      lines,
      interpretation,
      diviner_name,
      notes,
      change_info,
    }
  }

  /// The locally generated stand-in shown when the backend is unreachable:
  /// Qian, all yang, nothing changing.
  pub fn fallback(
    question: &str,
    diviner_name: String,
    interpretation: String,
    now: DateTime<Utc>,
  ) -> Self {
    let lines: Vec<Line> = (1..=6)
      .map(|position| Line::new(position, LineKind::Yang, false))
      .collect();
    let original_hexagram = Hexagram {
      number:          1,
      name:            "乾卦".into(),
      chinese_name:    "乾為天".into(),
      symbol:          "☰".into(),
      upper_trigram:   Trigram::Qian.bits(),
      lower_trigram:   Trigram::Qian.bits(),
      king_wen:        Some(TextExplanation {
        text:        "乾。元亨利貞。".into(),
        explanation: "乾卦：大吉大利，吉利的貞卜。".into(),
      }),
      image:           Some(TextExplanation {
        text:        "天行健，君子以自強不息。".into(),
        explanation: "天道剛健，運行不已。君子觀此卦象，從而以天為法，自強不息。"
          .into(),
      }),
      interpretations: None,
      lines:           lines.clone(),
    };
    let mutual_hexagram = Some(calculate_mutual_hexagram(&original_hexagram));

    Self {
      question: question.to_owned(),
      timestamp: now,
      original_hexagram,
      changed_hexagram: None,
      mutual_hexagram,
      lines,
      interpretation,
      diviner_name,
      notes: String::new(),
      change_info: ChangeInfo::default(),
    }
  }

  /// The six lines as classical values, if the result carries a full set.
  pub fn line_values(&self) -> Option<Vec<u8>> {
    (self.lines.len() == 6)
      .then(|| self.lines.iter().map(|l| u8::from(l.value())).collect())
  }
}

// ─── Mutual hexagram ─────────────────────────────────────────────────────────

/// Derive the mutual hexagram (互卦): lines 2–4 form the lower trigram and
/// lines 3–5 the upper.
///
/// Returns a clone of the input when it does not carry exactly six lines.
pub fn calculate_mutual_hexagram(hexagram: &Hexagram) -> Hexagram {
  if hexagram.lines.len() != 6 {
    return hexagram.clone();
  }
  let kinds: Vec<LineKind> = hexagram.lines.iter().map(|l| l.kind).collect();
  let lower = Trigram::from_lines([kinds[1], kinds[2], kinds[3]]);
  let upper = Trigram::from_lines([kinds[2], kinds[3], kinds[4]]);
  let kw = KingWen::lookup(upper, lower);

  let lines = lower
    .lines()
    .into_iter()
    .chain(upper.lines())
    .zip(1..)
    .map(|(kind, position)| Line::new(position, kind, false))
    .collect();

  Hexagram {
    number: kw.number,
    name: kw.pinyin.to_owned(),
    chinese_name: kw.chinese_name.to_owned(),
    symbol: kw.symbol().to_string(),
    upper_trigram: upper.bits(),
    lower_trigram: lower.bits(),
    king_wen: None,
    image: None,
    interpretations: None,
    lines,
  }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Accept RFC 3339 as well as the naive ISO form the backend emits. Naive
/// values are wall-clock time and read in the local zone; a time skipped by
/// a DST jump falls back to UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
  let local = naive
    .and_local_timezone(Local)
    .earliest()
    .map(|dt| dt.with_timezone(&Utc));
  Some(local.unwrap_or_else(|| naive.and_utc()))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::hexagram::LineValue;

  fn line_set(values: [u8; 6]) -> Vec<Line> {
    values
      .iter()
      .zip(1..)
      .map(|(v, p)| Line::from_value(p, LineValue::try_from(*v).unwrap()))
      .collect()
  }

  fn response(values: [u8; 6], with_changed: bool) -> DivinationResponse {
    let lines = line_set(values);
    let original = Hexagram::from_lines(lines.clone()).unwrap();
    let changed = if with_changed { original.transformed() } else { None };
    DivinationResponse {
      question:          "今天适合投资吗？".into(),
      original_hexagram: original,
      changed_hexagram:  changed,
      lines,
      timestamp:         "2024-05-01T08:30:00.123456".into(),
      interpretation:    "…".into(),
      najia:             None,
    }
  }

  #[test]
  fn one_changing_line_at_position_three() {
    let r = DivinationResult::from_response(
      response([7, 8, 6, 7, 8, 7], true),
      "匿名".into(),
      String::new(),
    );
    assert_eq!(r.change_info.changing_lines, vec![3]);
    assert!(r.change_info.has_changes);
    assert!(r.changed_hexagram.is_some());
    assert!(r.mutual_hexagram.is_some());
  }

  #[test]
  fn changed_is_dropped_without_changing_lines() {
    let mut resp = response([7, 8, 7, 8, 7, 8], false);
    resp.changed_hexagram = Some(resp.original_hexagram.clone());
    let r = DivinationResult::from_response(resp, String::new(), String::new());
    assert!(r.changed_hexagram.is_none());
    assert!(!r.change_info.has_changes);
  }

  #[test]
  fn changed_is_derived_when_backend_omits_it() {
    let r = DivinationResult::from_response(
      response([9, 7, 7, 7, 7, 7], false),
      String::new(),
      String::new(),
    );
    assert_eq!(r.changed_hexagram.unwrap().number, 44);
  }

  #[test]
  fn original_borrows_response_lines_when_bare() {
    let mut resp = response([7, 7, 7, 7, 7, 7], false);
    resp.original_hexagram.lines.clear();
    let r = DivinationResult::from_response(resp, String::new(), String::new());
    assert_eq!(r.original_hexagram.lines.len(), 6);
    assert!(r.mutual_hexagram.is_some());
  }

  #[test]
  fn naive_backend_timestamp_is_local_wall_clock() {
    let r = DivinationResult::from_response(
      response([7, 7, 7, 7, 7, 7], false),
      String::new(),
      String::new(),
    );
    let shown = r.timestamp.with_timezone(&Local);
    assert_eq!(shown.format("%Y-%m-%d %H:%M").to_string(), "2024-05-01 08:30");
  }

  #[test]
  fn offset_timestamps_keep_their_instant() {
    let t = parse_timestamp("2024-05-01T08:30:00+08:00").unwrap();
    assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 0, 30, 0).unwrap());
  }

  #[test]
  fn parse_timestamp_variants() {
    assert!(parse_timestamp("2024-05-01T08:30:00Z").is_some());
    assert!(parse_timestamp("2024-05-01T08:30:00+08:00").is_some());
    assert!(parse_timestamp("2024-05-01T08:30:00").is_some());
    assert!(parse_timestamp("yesterday").is_none());
  }

  #[test]
  fn mutual_is_pure() {
    let hex = Hexagram::from_lines(line_set([7, 8, 6, 9, 8, 7])).unwrap();
    assert_eq!(calculate_mutual_hexagram(&hex), calculate_mutual_hexagram(&hex));
  }

  #[test]
  fn mutual_is_identity_without_six_lines() {
    let mut hex = Hexagram::from_lines(line_set([7, 7, 7, 7, 7, 7])).unwrap();
    hex.lines.truncate(4);
    assert_eq!(calculate_mutual_hexagram(&hex), hex);
    hex.lines.clear();
    assert_eq!(calculate_mutual_hexagram(&hex), hex);
  }

  #[test]
  fn mutual_lookup() {
    let qian = Hexagram::from_lines(line_set([7, 7, 7, 7, 7, 7])).unwrap();
    assert_eq!(calculate_mutual_hexagram(&qian).number, 1);

    let jiji = Hexagram::from_lines(line_set([7, 8, 7, 8, 7, 8])).unwrap();
    let mutual = calculate_mutual_hexagram(&jiji);
    assert_eq!(mutual.number, 64);
    assert_eq!(mutual.chinese_name, "未济");
    assert_eq!(mutual.lower_trigram, "010");
    assert_eq!(mutual.upper_trigram, "101");
    assert!(mutual.lines.iter().all(|l| !l.changing));
  }

  #[test]
  fn fallback_is_all_yang_qian() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let r = DivinationResult::fallback("q", "匿名".into(), "offline".into(), now);
    assert_eq!(r.original_hexagram.name, "乾卦");
    assert!(r.lines.iter().all(|l| l.kind == LineKind::Yang && !l.changing));
    assert!(r.changed_hexagram.is_none());
    assert!(r.change_info.changing_lines.is_empty());
    assert_eq!(r.line_values(), Some(vec![7; 6]));
  }
}
