//! Application state machine and event dispatcher.
//!
//! Network calls run as spawned tasks and report back over a channel; the
//! event loop drains it between frames.

use std::{path::PathBuf, time::Instant};

use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use yijing_core::{
  backend::DivinationBackend,
  chat::ChatResponse,
  divination::DivinationResponse,
  language::Language,
  record::DivinationRecord,
  storage::Storage,
};

use crate::{
  chat::PendingChat,
  clipboard::Clipboard,
  history::HistoryStore,
  i18n::{Localization, Strings},
  workbench::{CopyOutcome, DivinationCall, Focus, Ticket, Workbench},
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Workbench,
  History,
}

/// A modal pane drawn over the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
  Help(String),
  /// Report text for the user to select by hand.
  ManualCopy(String),
}

/// What a spawned task reports back.
#[derive(Debug)]
pub enum TaskOutcome {
  Divination { ticket: Ticket, outcome: Result<DivinationResponse, String> },
  Chat { epoch: u64, outcome: Result<ChatResponse, String> },
  Health(bool),
  Help(Result<serde_json::Value, String>),
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<B, S> {
  pub screen:         Screen,
  pub overlay:        Option<Overlay>,
  pub workbench:      Workbench,
  pub localization:   Localization<S>,
  pub history:        HistoryStore<S>,
  /// History list as last loaded, for the history screen.
  pub records:        Vec<DivinationRecord>,
  pub history_cursor: usize,
  /// `None` until the first health check answers.
  pub healthy:        Option<bool>,
  pub export_dir:     PathBuf,

  backend:   B,
  clipboard: Box<dyn Clipboard + Send>,
  tx:        mpsc::UnboundedSender<TaskOutcome>,
  rx:        mpsc::UnboundedReceiver<TaskOutcome>,
}

impl<B, S> App<B, S>
where
  B: DivinationBackend + Clone + 'static,
  S: Storage + Clone,
{
  pub fn new(
    backend: B,
    storage: S,
    workbench: Workbench,
    default_language: Language,
    export_dir: PathBuf,
    clipboard: Box<dyn Clipboard + Send>,
  ) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      screen: Screen::Workbench,
      overlay: None,
      workbench,
      localization: Localization::new(storage.clone(), default_language),
      history: HistoryStore::new(storage),
      records: Vec::new(),
      history_cursor: 0,
      healthy: None,
      export_dir,
      backend,
      clipboard,
      tx,
      rx,
    }
  }

  pub fn strings(&self) -> &'static Strings { self.localization.strings() }

  pub fn language(&self) -> Language { self.localization.language() }

  // ── Tasks ─────────────────────────────────────────────────────────────────

  pub fn check_health(&self) {
    let backend = self.backend.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let _ = tx.send(TaskOutcome::Health(backend.health().await));
    });
  }

  fn spawn_divination(&self, call: DivinationCall) {
    tracing::debug!(ticket = call.ticket, kind = ?call.kind, "issuing divination");
    let backend = self.backend.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      if !call.delay.is_zero() {
        tokio::time::sleep(call.delay).await;
      }
      let outcome = backend.submit(call.request).await.map_err(|e| e.to_string());
      let _ = tx.send(TaskOutcome::Divination { ticket: call.ticket, outcome });
    });
  }

  fn spawn_chat(&self, pending: PendingChat) {
    let backend = self.backend.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let outcome = backend.chat(pending.request).await.map_err(|e| e.to_string());
      let _ = tx.send(TaskOutcome::Chat { epoch: pending.epoch, outcome });
    });
  }

  fn spawn_help(&self) {
    let backend = self.backend.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let outcome = backend.help().await.map_err(|e| e.to_string());
      let _ = tx.send(TaskOutcome::Help(outcome));
    });
  }

  /// Apply every outcome that has arrived, without waiting.
  pub fn drain_tasks(&mut self) {
    while let Ok(outcome) = self.rx.try_recv() {
      self.apply(outcome);
    }
  }

  /// Wait for the next outcome and apply it.
  pub async fn next_task(&mut self) {
    if let Some(outcome) = self.rx.recv().await {
      self.apply(outcome);
    }
  }

  fn apply(&mut self, outcome: TaskOutcome) {
    let strings = self.strings();
    match outcome {
      TaskOutcome::Divination { ticket, outcome } => {
        if outcome.is_err() {
          self.healthy = Some(false);
        }
        self.workbench.complete(ticket, outcome, strings, Utc::now());
      }
      TaskOutcome::Chat { epoch, outcome } => {
        let wb = &mut self.workbench;
        wb.chat.complete(epoch, outcome, &mut wb.notices, strings);
      }
      TaskOutcome::Health(ok) => {
        if !ok {
          tracing::warn!("backend health check failed; running degraded");
        }
        self.healthy = Some(ok);
      }
      TaskOutcome::Help(Ok(value)) => {
        let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        self.overlay = Some(Overlay::Help(text));
      }
      TaskOutcome::Help(Err(e)) => self.workbench.notices.error(strings.help_failed, e),
    }
  }

  /// Advance time-driven state (coin throws).
  pub fn tick(&mut self, now: Instant) { self.workbench.tick(now); }

  // ── Actions ───────────────────────────────────────────────────────────────

  /// Submit the question unless a divination is already loading.
  pub fn submit(&mut self) {
    if self.workbench.is_loading() {
      return;
    }
    if let Some(call) = self.workbench.begin_divination(self.language()) {
      self.spawn_divination(call);
    }
  }

  pub fn set_language(&mut self, language: Language) {
    let strings = self.strings();
    match self.localization.set_language(language) {
      Ok(true) => {}
      Ok(false) => return,
      Err(e) => {
        tracing::warn!(error = %e, "could not persist language");
        self.workbench.notices.error(strings.language_save_failed, e);
        return;
      }
    }
    tracing::info!(%language, "language changed");
    if let Some(call) = self.workbench.begin_refresh(language) {
      self.spawn_divination(call);
    }
  }

  pub fn send_chat(&mut self) {
    if let Some(pending) = self.workbench.begin_chat() {
      self.spawn_chat(pending);
    }
  }

  pub fn reset(&mut self) {
    let strings = self.strings();
    if self.workbench.reset_divination() {
      tracing::debug!("left history record view");
    }
    self.workbench.notices.success(strings.reset_done);
  }

  pub fn open_history(&mut self) {
    let strings = self.strings();
    match self.history.load() {
      Ok(records) => {
        self.records = records;
        self.history_cursor = 0;
        self.screen = Screen::History;
      }
      Err(e) => {
        tracing::warn!(error = %e, "could not read history");
        self.workbench.notices.error(strings.history_load_failed, e);
      }
    }
  }

  fn copy(&mut self) {
    let strings = self.strings();
    if let CopyOutcome::ManualFallback(text) =
      self.workbench.copy_to_clipboard(self.clipboard.as_mut(), strings)
    {
      self.overlay = Some(Overlay::ManualCopy(text));
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
      return false;
    }

    if self.overlay.is_some() {
      if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
        self.overlay = None;
      }
      return true;
    }

    match self.screen {
      Screen::Workbench => self.handle_workbench_key(key, ctrl),
      Screen::History => self.handle_history_key(key),
    }
    true
  }

  fn handle_workbench_key(&mut self, key: KeyEvent, ctrl: bool) {
    let strings = self.strings();
    if ctrl {
      match key.code {
        // Ctrl+Enter arrives as Ctrl+J on terminals without extended keys.
        KeyCode::Enter | KeyCode::Char('j') => self.submit(),
        KeyCode::Char('k') => self.workbench.focus = Focus::Question,
        KeyCode::Char('r') => self.reset(),
        KeyCode::Char('s') => {
          self.workbench.save_to_history(&self.history, strings, Utc::now());
        }
        KeyCode::Char('d') => {
          let today = Local::now().date_naive();
          self.workbench.download_result(&self.export_dir, strings, today);
        }
        KeyCode::Char('y') => self.copy(),
        _ => {}
      }
      return;
    }

    match key.code {
      KeyCode::F(1) => self.spawn_help(),
      KeyCode::F(2) => self.open_history(),
      KeyCode::F(3) => self.set_language(self.language().toggled()),
      KeyCode::F(4) => self.workbench.include_najia = !self.workbench.include_najia,
      KeyCode::F(5) => self.workbench.cycle_method(),
      KeyCode::F(6) => self.workbench.generate_input(Instant::now(), Local::now()),
      KeyCode::F(7) => self.workbench.cycle_view(false),
      KeyCode::F(8) => self.workbench.cycle_view(true),
      KeyCode::Tab => self.workbench.cycle_focus(true),
      KeyCode::BackTab => self.workbench.cycle_focus(false),
      KeyCode::Enter => match self.workbench.focus {
        Focus::Question => self.submit(),
        Focus::Chat => self.send_chat(),
        Focus::Notes => self.workbench.notes.push('\n'),
        Focus::Diviner | Focus::Digits => self.workbench.cycle_focus(true),
      },
      KeyCode::Backspace => {
        self.workbench.focused_field().pop();
      }
      KeyCode::Char(c) => self.workbench.focused_field().push(c),
      _ => {}
    }
  }

  fn handle_history_key(&mut self, key: KeyEvent) {
    let strings = self.strings();
    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Workbench,
      KeyCode::Down | KeyCode::Char('j') => {
        if self.history_cursor + 1 < self.records.len() {
          self.history_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.history_cursor = self.history_cursor.saturating_sub(1);
      }
      KeyCode::Enter => {
        if let Some(record) = self.records.get(self.history_cursor) {
          self.workbench.view_record(record, strings);
          self.screen = Screen::Workbench;
        }
      }
      KeyCode::Char('x') => match self.history.clear() {
        Ok(()) => {
          self.records.clear();
          self.history_cursor = 0;
          self.workbench.notices.success(strings.history_cleared);
        }
        Err(e) => self.workbench.notices.error(strings.clear_failed, e),
      },
      KeyCode::Char('e') => {
        let today = Local::now().date_naive();
        match self.history.export_to(&self.export_dir, today) {
          Ok(path) => self
            .workbench
            .notices
            .info(strings.history_exported, path.display().to_string()),
          Err(e) => self.workbench.notices.error(strings.export_failed, e),
        }
      }
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use rand::{SeedableRng, rngs::StdRng};
  use yijing_core::storage::{LANGUAGE_KEY, MemoryStorage};

  use super::*;
  use crate::{
    clipboard::Unavailable,
    config::Latency,
    notice::NoticeLevel,
    testing::{FakeBackend, FlakyStorage},
    workbench::ViewMode,
  };

  type TestApp = App<FakeBackend, Arc<MemoryStorage>>;

  fn app(backend: FakeBackend) -> (TestApp, tempfile::TempDir) {
    app_with_storage(backend, Arc::new(MemoryStorage::new()))
  }

  fn app_with_storage<S: Storage + Clone>(
    backend: FakeBackend,
    storage: S,
  ) -> (App<FakeBackend, S>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let wb = Workbench::with_rng(Latency::NONE, false, StdRng::seed_from_u64(3));
    let app = App::new(
      backend,
      storage,
      wb,
      Language::Zh,
      dir.path().to_path_buf(),
      Box::new(Unavailable),
    );
    (app, dir)
  }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  fn ctrl(c: char) -> KeyEvent { KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL) }

  fn type_text<S: Storage + Clone>(app: &mut App<FakeBackend, S>, text: &str) {
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[tokio::test]
  async fn typed_question_submits_with_ctrl_enter() {
    let backend = FakeBackend::default();
    let (mut app, _dir) = app(backend.clone());
    type_text(&mut app, "问事业");
    assert!(app.handle_key(ctrl('j')));
    assert!(app.workbench.is_loading());

    // A second submit while loading is ignored.
    app.handle_key(ctrl('j'));
    app.next_task().await;

    assert_eq!(backend.requests().len(), 1);
    assert_eq!(app.workbench.result().unwrap().question, "问事业");
  }

  #[tokio::test]
  async fn blank_submit_is_a_no_op() {
    let backend = FakeBackend::default();
    let (mut app, _dir) = app(backend.clone());
    app.workbench.focus = Focus::Notes;
    app.handle_key(ctrl('j'));
    assert!(!app.workbench.is_loading());
    assert_eq!(app.workbench.focus, Focus::Question);
  }

  #[tokio::test]
  async fn language_toggle_persists_and_refreshes() {
    let backend = FakeBackend::default();
    let storage = Arc::new(MemoryStorage::new());
    let (mut app, _dir) = app_with_storage(backend.clone(), Arc::clone(&storage));
    type_text(&mut app, "q");
    app.submit();
    app.next_task().await;

    app.handle_key(key(KeyCode::F(3)));
    assert_eq!(app.language(), Language::En);
    app.next_task().await;

    assert_eq!(app.workbench.result().unwrap().interpretation, "interpretation (en)");
    assert_eq!(backend.requests()[1].language, Language::En);
    assert_eq!(storage.get(LANGUAGE_KEY).unwrap().as_deref(), Some("en"));
  }

  #[tokio::test]
  async fn chat_from_focused_field() {
    let backend = FakeBackend::default();
    let (mut app, _dir) = app(backend.clone());
    type_text(&mut app, "q");
    app.submit();
    app.next_task().await;

    app.workbench.focus = Focus::Chat;
    type_text(&mut app, "why?");
    app.handle_key(key(KeyCode::Enter));
    app.next_task().await;

    let msgs = app.workbench.chat.messages();
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[1].content, "on q: why?");
  }

  #[tokio::test]
  async fn save_view_and_clear_history() {
    let backend = FakeBackend::default();
    let (mut app, _dir) = app(backend);
    type_text(&mut app, "q");
    app.submit();
    app.next_task().await;
    app.handle_key(ctrl('s'));

    app.handle_key(key(KeyCode::F(2)));
    assert_eq!(app.screen, Screen::History);
    assert_eq!(app.records.len(), 1);

    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.screen, Screen::Workbench);
    assert!(app.workbench.viewing_record().is_some());

    app.handle_key(key(KeyCode::F(2)));
    app.handle_key(key(KeyCode::Char('x')));
    assert!(app.records.is_empty());
    assert!(app.history.list().is_empty());
  }

  #[tokio::test]
  async fn history_export_and_download_write_files() {
    let backend = FakeBackend::default();
    let (mut app, dir) = app(backend);
    type_text(&mut app, "q");
    app.submit();
    app.next_task().await;
    app.handle_key(ctrl('s'));
    app.handle_key(ctrl('d'));
    app.handle_key(key(KeyCode::F(2)));
    app.handle_key(key(KeyCode::Char('e')));

    let names: Vec<String> = std::fs::read_dir(dir.path())
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    assert!(names.iter().any(|n| n.starts_with("divination_history_")));
    assert!(names.iter().any(|n| n.starts_with("易经占卜结果_")));
  }

  #[tokio::test]
  async fn copy_falls_back_to_overlay() {
    let backend = FakeBackend::default();
    let (mut app, _dir) = app(backend);
    type_text(&mut app, "q");
    app.submit();
    app.next_task().await;

    app.handle_key(ctrl('y'));
    assert!(matches!(app.overlay, Some(Overlay::ManualCopy(_))));
    // Keys are swallowed by the overlay until it closes.
    app.handle_key(key(KeyCode::Char('z')));
    assert_eq!(app.workbench.question, "q");
    app.handle_key(key(KeyCode::Esc));
    assert!(app.overlay.is_none());
  }

  #[tokio::test]
  async fn failed_divination_marks_backend_unhealthy() {
    let backend = FakeBackend::failing();
    let (mut app, _dir) = app(backend);
    app.check_health();
    app.next_task().await;
    assert_eq!(app.healthy, Some(false));

    type_text(&mut app, "q");
    app.submit();
    app.next_task().await;
    assert_eq!(app.workbench.result().unwrap().original_hexagram.name, "乾卦");
  }

  #[tokio::test]
  async fn help_overlay_and_view_keys() {
    let backend = FakeBackend::default();
    let (mut app, _dir) = app(backend);
    app.handle_key(key(KeyCode::F(1)));
    app.next_task().await;
    assert!(matches!(&app.overlay, Some(Overlay::Help(text)) if text.contains("usage")));
    app.handle_key(key(KeyCode::Esc));

    type_text(&mut app, "q");
    app.submit();
    app.next_task().await;
    app.handle_key(key(KeyCode::F(8)));
    assert_eq!(app.workbench.view(), ViewMode::Changed);
  }

  #[tokio::test]
  async fn quits_on_ctrl_q() {
    let (mut app, _dir) = app(FakeBackend::default());
    assert!(app.handle_key(key(KeyCode::Char('q'))));
    assert!(!app.handle_key(ctrl('q')));
  }

  #[tokio::test]
  async fn unsaved_language_change_is_reported() {
    let storage = Arc::new(FlakyStorage::default());
    let (mut app, _dir) = app_with_storage(FakeBackend::default(), Arc::clone(&storage));
    storage.fail_writes(true);

    app.handle_key(key(KeyCode::F(3)));
    assert_eq!(app.language(), Language::Zh);
    let notice = app.workbench.notices.latest().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.title, app.strings().language_save_failed);
  }

  #[tokio::test]
  async fn unreadable_history_stays_on_workbench() {
    let storage = Arc::new(FlakyStorage::default());
    let (mut app, _dir) = app_with_storage(FakeBackend::default(), Arc::clone(&storage));
    storage.fail_reads(true);

    app.handle_key(key(KeyCode::F(2)));
    assert_eq!(app.screen, Screen::Workbench);
    let notice = app.workbench.notices.latest().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.title, app.strings().history_load_failed);
  }

  #[tokio::test]
  async fn failed_clear_reports_and_keeps_records() {
    let storage = Arc::new(FlakyStorage::default());
    let (mut app, _dir) = app_with_storage(FakeBackend::default(), Arc::clone(&storage));
    type_text(&mut app, "q");
    app.submit();
    app.next_task().await;
    app.handle_key(ctrl('s'));
    app.handle_key(key(KeyCode::F(2)));

    storage.fail_writes(true);
    app.handle_key(key(KeyCode::Char('x')));
    assert_eq!(app.records.len(), 1);
    assert_eq!(app.workbench.notices.latest().unwrap().title, app.strings().clear_failed);
  }
}
