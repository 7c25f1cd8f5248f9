//! Plain-text rendering of a result, for download and clipboard copy.

use std::{
  fmt::Write as _,
  path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};
use yijing_core::divination::DivinationResult;

use crate::{Result, i18n::Strings};

/// Render the fixed report in the language of `s`.
pub fn render(result: &DivinationResult, s: &Strings) -> String {
  let diviner = if result.diviner_name.trim().is_empty() {
    s.anonymous
  } else {
    result.diviner_name.trim()
  };
  let when = result.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");

  let mut out = String::new();
  // Writing to a String cannot fail.
  let _ = writeln!(out, "{}", s.report_title);
  let _ = writeln!(out, "{}", "=".repeat(32));
  let _ = writeln!(out);
  let _ = writeln!(out, "{}: {}", s.report_question, result.question);
  let _ = writeln!(out, "{}: {diviner}", s.report_diviner);
  let _ = writeln!(out, "{}: {when}", s.report_time);
  let _ = writeln!(
    out,
    "{}: {} ({})",
    s.report_original, result.original_hexagram.name, result.original_hexagram.chinese_name
  );
  if let Some(changed) = &result.changed_hexagram {
    let _ = writeln!(out, "{}: {} ({})", s.report_changed, changed.name, changed.chinese_name);
  }
  let _ = writeln!(out);
  let _ = writeln!(out, "{}:", s.report_interpretation);
  let _ = writeln!(out, "{}", result.interpretation);
  if !result.notes.trim().is_empty() {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}:", s.report_notes);
    let _ = writeln!(out, "{}", result.notes.trim());
  }
  let _ = writeln!(out);
  let _ = write!(out, "{}", s.report_footer);
  out
}

/// `<prefix>_<YYYY-MM-DD>.txt`
pub fn file_name(s: &Strings, date: NaiveDate) -> String {
  format!("{}_{}.txt", s.report_file_prefix, date.format("%Y-%m-%d"))
}

/// Write the report into `dir` and return its path.
pub fn download(
  result: &DivinationResult,
  s: &Strings,
  dir: &Path,
  date: NaiveDate,
) -> Result<PathBuf> {
  std::fs::create_dir_all(dir)?;
  let path = dir.join(file_name(s, date));
  std::fs::write(&path, render(result, s))?;
  tracing::info!(path = %path.display(), "result downloaded");
  Ok(path)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::i18n::{EN, ZH};

  fn result() -> DivinationResult {
    DivinationResult::fallback("事业如何？", String::new(), "自强不息".into(), Utc::now())
  }

  #[test]
  fn chinese_report() {
    let text = render(&result(), &ZH);
    assert!(text.starts_with("易经占卜结果"));
    assert!(text.contains("问题: 事业如何？"));
    assert!(text.contains("占卜者: 匿名"));
    assert!(text.contains("本卦: 乾卦 (乾為天)"));
    assert!(!text.contains("变卦"));
    assert!(!text.contains("备注"));
  }

  #[test]
  fn english_report_with_notes() {
    let mut r = result();
    r.diviner_name = "Lin".into();
    r.notes = "revisit in spring".into();
    let text = render(&r, &EN);
    assert!(text.contains("Diviner: Lin"));
    assert!(text.contains("Notes:\nrevisit in spring"));
    assert!(text.ends_with("-- I Ching Divination"));
  }

  #[test]
  fn download_writes_localized_file() {
    let dir = tempfile::tempdir().unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let path = download(&result(), &ZH, dir.path(), date).unwrap();
    assert_eq!(path.file_name().unwrap(), "易经占卜结果_2024-06-01.txt");
    assert!(std::fs::read_to_string(path).unwrap().contains("自强不息"));
  }
}
