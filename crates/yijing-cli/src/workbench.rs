//! The workbench: one divination session and every action on it.
//!
//! Network calls are split into a `begin_*` step that mutates state and
//! returns the request to send, and [`Workbench::complete`] which applies
//! the outcome. The app spawns the call in between; tests can drive the
//! pair directly or use the `async` conveniences.

use std::{
  path::{Path, PathBuf},
  time::{Duration, Instant},
};

use chrono::{DateTime, Local, NaiveDate, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use strum::{Display, EnumIter, IntoEnumIterator};
use yijing_core::{
  backend::{DivinationBackend, DivinationRequest},
  divination::{DivinationResponse, DivinationResult},
  language::Language,
  method::{DivinationInputResult, DivinationMethod, MethodSelector},
  najia::NajiaDivinationResult,
  record::DivinationRecord,
  storage::Storage,
};

use crate::{
  chat::{ChatPanel, PendingChat},
  clipboard::Clipboard,
  config::Latency,
  history::HistoryStore,
  i18n::Strings,
  notice::Notices,
  report,
};

/// Identifies one issued divination call. Only the latest is honoured.
pub type Ticket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
  /// A fresh divination; failure installs the fallback result.
  Divination,
  /// Re-fetch of the current result in another language; failure keeps the
  /// stale result.
  Refresh,
}

#[derive(Debug, Clone)]
pub struct DivinationCall {
  pub ticket:  Ticket,
  pub kind:    CallKind,
  pub request: DivinationRequest,
  /// Simulated latency to wait before sending.
  pub delay:   Duration,
}

#[derive(Debug, Clone)]
struct Pending {
  ticket:  Ticket,
  kind:    CallKind,
  request: DivinationRequest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ViewMode {
  #[default]
  Original,
  Changed,
  Mutual,
  Najia,
}

impl ViewMode {
  pub fn label(self, s: &Strings) -> &'static str {
    match self {
      Self::Original => s.original,
      Self::Changed => s.changed,
      Self::Mutual => s.mutual,
      Self::Najia => s.najia,
    }
  }
}

/// The text field receiving keystrokes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter)]
pub enum Focus {
  #[default]
  Question,
  Diviner,
  Notes,
  /// Only reachable while the numbers method is selected.
  Digits,
  Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
  Copied,
  /// The clipboard refused; the text is handed back for manual selection.
  ManualFallback(String),
  /// There was nothing to copy.
  Nothing,
}

pub struct Workbench {
  pub question:      String,
  pub diviner_name:  String,
  pub notes:         String,
  pub include_najia: bool,
  pub selector:      MethodSelector,
  pub focus:         Focus,
  pub notices:       Notices,
  pub chat:          ChatPanel,

  result:         Option<DivinationResult>,
  najia:          Option<NajiaDivinationResult>,
  input:          Option<DivinationInputResult>,
  view:           ViewMode,
  viewing_record: Option<String>,
  pending:        Option<Pending>,
  last_ticket:    Ticket,
  latency:        Latency,
  rng:            StdRng,
}

impl Workbench {
  pub fn new(latency: Latency, include_najia: bool) -> Self {
    Self::with_rng(latency, include_najia, StdRng::from_entropy())
  }

  pub fn with_rng(latency: Latency, include_najia: bool, rng: StdRng) -> Self {
    Self {
      question: String::new(),
      diviner_name: String::new(),
      notes: String::new(),
      include_najia,
      selector: MethodSelector::default(),
      focus: Focus::default(),
      notices: Notices::default(),
      chat: ChatPanel::default(),
      result: None,
      najia: None,
      input: None,
      view: ViewMode::default(),
      viewing_record: None,
      pending: None,
      last_ticket: 0,
      latency,
      rng,
    }
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn result(&self) -> Option<&DivinationResult> { self.result.as_ref() }

  pub fn najia(&self) -> Option<&NajiaDivinationResult> { self.najia.as_ref() }

  pub fn input(&self) -> Option<&DivinationInputResult> { self.input.as_ref() }

  pub fn view(&self) -> ViewMode { self.view }

  pub fn viewing_record(&self) -> Option<&str> { self.viewing_record.as_deref() }

  /// A fresh divination is in flight.
  pub fn is_loading(&self) -> bool {
    matches!(&self.pending, Some(p) if p.kind == CallKind::Divination)
  }

  pub fn is_refreshing(&self) -> bool {
    matches!(&self.pending, Some(p) if p.kind == CallKind::Refresh)
  }

  /// The current result with the diviner and notes fields applied.
  pub fn snapshot(&self) -> Option<DivinationResult> {
    self.result.as_ref().map(|r| DivinationResult {
      diviner_name: self.diviner_name.trim().to_owned(),
      notes: self.notes.clone(),
      ..r.clone()
    })
  }

  // ── Focus and fields ──────────────────────────────────────────────────────

  fn focusable(&self) -> Vec<Focus> {
    let numbers = self.selector.method() == DivinationMethod::Numbers;
    Focus::iter().filter(|f| *f != Focus::Digits || numbers).collect()
  }

  pub fn cycle_focus(&mut self, forward: bool) {
    let order = self.focusable();
    let n = order.len();
    let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
    self.focus = if forward { order[(i + 1) % n] } else { order[(i + n - 1) % n] };
  }

  pub fn focused_field(&mut self) -> &mut String {
    match self.focus {
      Focus::Question => &mut self.question,
      Focus::Diviner => &mut self.diviner_name,
      Focus::Notes => &mut self.notes,
      Focus::Digits => &mut self.selector.digits,
      Focus::Chat => &mut self.chat.input,
    }
  }

  // ── Input methods ─────────────────────────────────────────────────────────

  /// Switch method, discarding any input produced by the previous one.
  pub fn select_method(&mut self, method: DivinationMethod) {
    if method != self.selector.method() {
      self.selector.select(method);
      self.input = None;
      if self.focus == Focus::Digits {
        self.focus = Focus::Question;
      }
    }
  }

  pub fn cycle_method(&mut self) {
    let all: Vec<_> = DivinationMethod::iter().collect();
    let i = all.iter().position(|m| *m == self.selector.method()).unwrap_or(0);
    self.select_method(all[(i + 1) % all.len()]);
  }

  /// Run the selected method's generate action.
  pub fn generate_input(&mut self, now: Instant, local_now: DateTime<Local>) {
    if let Some(result) = self.selector.generate(now, local_now, &mut self.rng) {
      tracing::debug!(method = %result.method(), "input generated");
      self.input = Some(result);
    }
  }

  /// Advance a staged coin throw. Returns `true` when it just completed.
  pub fn tick(&mut self, now: Instant) -> bool {
    match self.selector.tick(now, &mut self.rng) {
      Some(result) => {
        self.input = Some(result);
        true
      }
      None => false,
    }
  }

  // ── Divination ────────────────────────────────────────────────────────────

  fn issue(&mut self, kind: CallKind, request: DivinationRequest, delay: Duration) -> DivinationCall {
    self.last_ticket += 1;
    let ticket = self.last_ticket;
    self.pending = Some(Pending { ticket, kind, request: request.clone() });
    DivinationCall { ticket, kind, request, delay }
  }

  fn sample_latency(&mut self) -> Duration {
    let Latency { min, max } = self.latency;
    if min >= max { min } else { self.rng.gen_range(min..=max) }
  }

  /// Start a divination. With a blank question the question field takes
  /// focus and nothing is issued.
  ///
  /// The input result is consumed: methods that drew line values go to the
  /// manual endpoint, the rest let the backend draw.
  pub fn begin_divination(&mut self, language: Language) -> Option<DivinationCall> {
    let question = self.question.trim();
    if question.is_empty() {
      self.focus = Focus::Question;
      return None;
    }
    let request = DivinationRequest {
      question: question.to_owned(),
      language,
      include_najia: self.include_najia,
      lines: self
        .input
        .take()
        .and_then(|i| i.line_values())
        .map(|values| values.into_iter().map(u8::from).collect()),
    };
    let delay = self.sample_latency();
    Some(self.issue(CallKind::Divination, request, delay))
  }

  /// Re-issue for a new language. A divination in flight is re-sent in the
  /// new language; otherwise the displayed result is re-fetched from its own
  /// six lines so the hexagram stays put.
  pub fn begin_refresh(&mut self, language: Language) -> Option<DivinationCall> {
    let in_flight = self
      .pending
      .as_ref()
      .filter(|p| p.kind == CallKind::Divination)
      .map(|p| DivinationRequest { language, ..p.request.clone() });
    if let Some(request) = in_flight {
      return Some(self.issue(CallKind::Divination, request, Duration::ZERO));
    }

    if self.viewing_record.is_some() {
      return None;
    }
    let result = self.result.as_ref()?;
    let request = DivinationRequest {
      question: result.question.clone(),
      language,
      include_najia: self.include_najia,
      lines: Some(result.line_values()?),
    };
    Some(self.issue(CallKind::Refresh, request, Duration::ZERO))
  }

  /// Apply the outcome of call `ticket`. Returns `false` when a later call
  /// has superseded it.
  pub fn complete(
    &mut self,
    ticket: Ticket,
    outcome: Result<DivinationResponse, String>,
    strings: &Strings,
    now: DateTime<Utc>,
  ) -> bool {
    let Some(pending) = self.pending.take_if(|p| p.ticket == ticket) else {
      tracing::debug!(ticket, latest = self.last_ticket, "discarding stale divination");
      return false;
    };

    match (pending.kind, outcome) {
      (CallKind::Divination, Ok(resp)) => {
        self.install(resp, pending.request.include_najia);
        self.view = ViewMode::Original;
        self.viewing_record = None;
        self.notices.success(strings.divination_done);
      }
      (CallKind::Divination, Err(e)) => {
        tracing::warn!(error = %e, "divination failed; showing fallback result");
        self.notices.error(strings.divination_failed, &e);
        let mut fallback = DivinationResult::fallback(
          &pending.request.question,
          self.diviner_name.trim().to_owned(),
          strings.fallback_interpretation.to_owned(),
          now,
        );
        fallback.notes = self.notes.clone();
        self.result = Some(fallback);
        self.najia = None;
        self.view = ViewMode::Original;
        self.viewing_record = None;
      }
      (CallKind::Refresh, Ok(resp)) => {
        self.install(resp, pending.request.include_najia);
        if !self.can_select(self.view) {
          self.view = ViewMode::Original;
        }
      }
      (CallKind::Refresh, Err(e)) => {
        tracing::warn!(error = %e, "language refresh failed; keeping result");
        self.notices.error(strings.refresh_failed, &e);
      }
    }
    true
  }

  fn install(&mut self, mut resp: DivinationResponse, include_najia: bool) {
    let najia = resp.najia.take().filter(|_| include_najia);
    self.result = Some(DivinationResult::from_response(
      resp,
      self.diviner_name.trim().to_owned(),
      self.notes.clone(),
    ));
    self.najia = najia;
  }

  async fn run<B: DivinationBackend>(
    &mut self,
    backend: &B,
    call: DivinationCall,
    strings: &Strings,
  ) {
    if !call.delay.is_zero() {
      tokio::time::sleep(call.delay).await;
    }
    let outcome = backend.submit(call.request).await.map_err(|e| e.to_string());
    self.complete(call.ticket, outcome, strings, Utc::now());
  }

  /// Divine and wait for the outcome. Returns `false` if nothing was issued.
  pub async fn perform_divination<B: DivinationBackend>(
    &mut self,
    backend: &B,
    language: Language,
    strings: &Strings,
  ) -> bool {
    let Some(call) = self.begin_divination(language) else {
      return false;
    };
    self.run(backend, call, strings).await;
    true
  }

  /// Refresh for `language` and wait for the outcome.
  pub async fn refresh<B: DivinationBackend>(
    &mut self,
    backend: &B,
    language: Language,
    strings: &Strings,
  ) -> bool {
    let Some(call) = self.begin_refresh(language) else {
      return false;
    };
    self.run(backend, call, strings).await;
    true
  }

  // ── Views ─────────────────────────────────────────────────────────────────

  pub fn can_select(&self, view: ViewMode) -> bool {
    let Some(result) = &self.result else {
      return view == ViewMode::Original;
    };
    match view {
      ViewMode::Original => true,
      ViewMode::Changed => result.changed_hexagram.is_some(),
      ViewMode::Mutual => result.mutual_hexagram.is_some(),
      ViewMode::Najia => self.najia.is_some(),
    }
  }

  pub fn selectable_views(&self) -> Vec<ViewMode> {
    ViewMode::iter().filter(|v| self.can_select(*v)).collect()
  }

  /// Switch view if `view` is available.
  pub fn select_view(&mut self, view: ViewMode) -> bool {
    let ok = self.can_select(view);
    if ok {
      self.view = view;
    }
    ok
  }

  pub fn cycle_view(&mut self, forward: bool) {
    let views = self.selectable_views();
    let n = views.len();
    if n == 0 {
      return;
    }
    let i = views.iter().position(|v| *v == self.view).unwrap_or(0);
    self.view = if forward { views[(i + 1) % n] } else { views[(i + n - 1) % n] };
  }

  // ── Chat ──────────────────────────────────────────────────────────────────

  /// Send the chat input about the current result.
  pub fn begin_chat(&mut self) -> Option<PendingChat> {
    self.chat.submit_input(self.result.as_ref())
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// Start over. Returns whether a history record was being viewed.
  pub fn reset_divination(&mut self) -> bool {
    self.question.clear();
    self.diviner_name.clear();
    self.notes.clear();
    self.result = None;
    self.najia = None;
    self.input = None;
    self.pending = None;
    self.selector.clear();
    self.chat.clear();
    self.view = ViewMode::Original;
    self.focus = Focus::Question;
    self.viewing_record.take().is_some()
  }

  /// Show a saved record. Records carry no lines, so only the original and
  /// changed views are available and no refresh is possible.
  pub fn view_record(&mut self, record: &DivinationRecord, strings: &Strings) {
    self.pending = None;
    self.result = Some(record.to_result(strings.record_interpretation.to_owned()));
    self.question = record.question.clone();
    self.diviner_name = record.diviner_name.clone().unwrap_or_default();
    self.notes = record.notes.clone().unwrap_or_default();
    self.najia = None;
    self.input = None;
    self.view = ViewMode::Original;
    self.viewing_record = Some(record.id.clone());
  }

  /// Save the current result. No-op without one.
  pub fn save_to_history<S: Storage>(
    &mut self,
    history: &HistoryStore<S>,
    strings: &Strings,
    now: DateTime<Utc>,
  ) -> bool {
    let Some(result) = self.snapshot() else {
      return false;
    };
    match history.append(DivinationRecord::from_result(&result, now)) {
      Ok(()) => {
        self.notices.success(strings.saved);
        true
      }
      Err(e) => {
        tracing::warn!(error = %e, "could not save to history");
        self.notices.error(strings.save_failed, e);
        false
      }
    }
  }

  /// Write the text report into `dir`.
  pub fn download_result(
    &mut self,
    dir: &Path,
    strings: &Strings,
    date: NaiveDate,
  ) -> Option<PathBuf> {
    let result = self.snapshot()?;
    match report::download(&result, strings, dir, date) {
      Ok(path) => {
        self.notices.info(strings.downloaded, path.display().to_string());
        Some(path)
      }
      Err(e) => {
        tracing::warn!(error = %e, "could not write report");
        self.notices.error(strings.download_failed, e);
        None
      }
    }
  }

  pub fn copy_to_clipboard(&mut self, clipboard: &mut dyn Clipboard, strings: &Strings) -> CopyOutcome {
    let Some(result) = self.snapshot() else {
      return CopyOutcome::Nothing;
    };
    let text = report::render(&result, strings);
    match clipboard.set_text(&text) {
      Ok(()) => {
        self.notices.success(strings.copied);
        CopyOutcome::Copied
      }
      Err(e) => {
        tracing::debug!(error = %e, "clipboard unavailable; offering manual copy");
        self.notices.info(strings.copy_manual, e.to_string());
        CopyOutcome::ManualFallback(text)
      }
    }
  }
}
