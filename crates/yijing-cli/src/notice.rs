//! Transient notices shown in the status bar.

use std::collections::VecDeque;

/// Oldest notices are dropped beyond this many.
const MAX_NOTICES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Success,
  Info,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level:  NoticeLevel,
  pub title:  String,
  pub detail: Option<String>,
}

impl Notice {
  /// `title: detail`, or just the title.
  pub fn text(&self) -> String {
    match &self.detail {
      Some(d) => format!("{}: {d}", self.title),
      None => self.title.clone(),
    }
  }
}

#[derive(Debug, Default)]
pub struct Notices {
  queue: VecDeque<Notice>,
}

impl Notices {
  pub fn push(&mut self, level: NoticeLevel, title: impl Into<String>, detail: Option<String>) {
    if self.queue.len() == MAX_NOTICES {
      self.queue.pop_front();
    }
    self.queue.push_back(Notice { level, title: title.into(), detail });
  }

  pub fn success(&mut self, title: impl Into<String>) {
    self.push(NoticeLevel::Success, title, None);
  }

  pub fn info(&mut self, title: impl Into<String>, detail: impl Into<String>) {
    self.push(NoticeLevel::Info, title, Some(detail.into()));
  }

  pub fn error(&mut self, title: impl Into<String>, detail: impl ToString) {
    self.push(NoticeLevel::Error, title, Some(detail.to_string()));
  }

  pub fn latest(&self) -> Option<&Notice> { self.queue.back() }

  pub fn len(&self) -> usize { self.queue.len() }

  pub fn is_empty(&self) -> bool { self.queue.is_empty() }

  pub fn drain(&mut self) -> impl Iterator<Item = Notice> + '_ { self.queue.drain(..) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn latest_and_text() {
    let mut n = Notices::default();
    assert!(n.latest().is_none());
    n.success("saved");
    n.error("failed", "timeout");
    let last = n.latest().unwrap();
    assert_eq!(last.level, NoticeLevel::Error);
    assert_eq!(last.text(), "failed: timeout");
    assert_eq!(n.drain().count(), 2);
    assert!(n.is_empty());
  }

  #[test]
  fn bounded() {
    let mut n = Notices::default();
    for i in 0..30 {
      n.success(format!("{i}"));
    }
    assert_eq!(n.len(), MAX_NOTICES);
    assert_eq!(n.latest().unwrap().title, "29");
  }
}
