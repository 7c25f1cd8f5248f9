//! In-memory backend and storage doubles shared by the workbench, chat,
//! history and app tests.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicBool, Ordering},
};

use thiserror::Error;
use yijing_core::{
  backend::{DivinationBackend, DivinationRequest},
  chat::{ChatRequest, ChatResponse},
  divination::DivinationResponse,
  hexagram::{Hexagram, Line, LineValue},
  language::Language,
  najia::{GanZhiTime, NajiaDivinationResult, NajiaHexagramInfo},
  storage::{MemoryStorage, Storage},
};

/// Lines the fake draws when the caller supplies none: one change at 3.
pub const DRAWN: [u8; 6] = [7, 8, 6, 7, 8, 7];

#[derive(Debug, Error)]
#[error("backend unavailable")]
pub struct FakeError;

#[derive(Clone, Default)]
pub struct FakeBackend {
  pub fail:     Arc<AtomicBool>,
  pub requests: Arc<Mutex<Vec<DivinationRequest>>>,
  pub chats:    Arc<Mutex<Vec<ChatRequest>>>,
}

impl FakeBackend {
  pub fn failing() -> Self {
    let b = Self::default();
    b.set_failing(true);
    b
  }

  pub fn set_failing(&self, fail: bool) { self.fail.store(fail, Ordering::SeqCst); }

  pub fn requests(&self) -> Vec<DivinationRequest> { self.requests.lock().unwrap().clone() }

  pub fn chats(&self) -> Vec<ChatRequest> { self.chats.lock().unwrap().clone() }

  fn check(&self) -> Result<(), FakeError> {
    if self.fail.load(Ordering::SeqCst) { Err(FakeError) } else { Ok(()) }
  }

  fn answer(&self, request: DivinationRequest) -> Result<DivinationResponse, FakeError> {
    self.requests.lock().unwrap().push(request.clone());
    self.check()?;
    Ok(response(&request))
  }
}

/// The response the fake gives for `request`; the interpretation names the
/// language so tests can tell refreshes apart.
pub fn response(request: &DivinationRequest) -> DivinationResponse {
  let values = request.lines.clone().unwrap_or_else(|| DRAWN.to_vec());
  let lines: Vec<Line> = values
    .iter()
    .zip(1..)
    .map(|(v, p)| Line::from_value(p, LineValue::try_from(*v).unwrap()))
    .collect();
  let original = Hexagram::from_lines(lines.clone()).unwrap();
  let najia = request.include_najia.then(|| NajiaDivinationResult {
    question:                   request.question.clone(),
    divination_time:            "2024-05-01 08:30".into(),
    ganzhi_time:                GanZhiTime::default(),
    original_hexagram:          NajiaHexagramInfo {
      number:       original.number,
      name:         original.chinese_name.clone(),
      palace:       "乾".into(),
      wuxing:       "金".into(),
      lines:        Vec::new(),
      shi_yao_pos:  3,
      ying_yao_pos: 6,
    },
    changed_hexagram:           None,
    traditional_interpretation: String::new(),
    detailed_analysis:          Default::default(),
  });
  DivinationResponse {
    question: request.question.trim().to_owned(),
    changed_hexagram: original.transformed(),
    original_hexagram: original,
    lines,
    timestamp: "2024-05-01T08:30:00".into(),
    interpretation: format!("interpretation ({})", request.language),
    najia,
  }
}

impl DivinationBackend for FakeBackend {
  type Error = FakeError;

  async fn health(&self) -> bool { self.check().is_ok() }

  async fn divine(
    &self,
    question: String,
    language: Language,
    include_najia: bool,
  ) -> Result<DivinationResponse, FakeError> {
    self.answer(DivinationRequest { question, language, include_najia, lines: None })
  }

  async fn divine_manual(
    &self,
    question: String,
    lines: Vec<u8>,
    language: Language,
    include_najia: bool,
  ) -> Result<DivinationResponse, FakeError> {
    self.answer(DivinationRequest { question, language, include_najia, lines: Some(lines) })
  }

  async fn help(&self) -> Result<serde_json::Value, FakeError> {
    self.check()?;
    Ok(serde_json::json!({ "usage": "ask a question" }))
  }

  async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, FakeError> {
    let reply = format!("on {}: {}", request.hexagram_context.question, request.message);
    self.chats.lock().unwrap().push(request);
    self.check()?;
    Ok(ChatResponse { response: reply })
  }
}

// ─── Storage ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("database is busy")]
pub struct Busy;

/// Memory storage whose reads and writes can be made to fail on demand.
#[derive(Debug, Default)]
pub struct FlakyStorage {
  inner:       MemoryStorage,
  fail_reads:  AtomicBool,
  fail_writes: AtomicBool,
}

impl FlakyStorage {
  pub fn fail_reads(&self, fail: bool) { self.fail_reads.store(fail, Ordering::SeqCst); }

  pub fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }

  fn writable(&self) -> Result<(), Busy> {
    if self.fail_writes.load(Ordering::SeqCst) { Err(Busy) } else { Ok(()) }
  }
}

impl Storage for FlakyStorage {
  type Error = Busy;

  fn get(&self, key: &str) -> Result<Option<String>, Busy> {
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(Busy);
    }
    Ok(self.inner.get(key).unwrap_or_default())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), Busy> {
    self.writable()?;
    let _ = self.inner.set(key, value);
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), Busy> {
    self.writable()?;
    let _ = self.inner.remove(key);
    Ok(())
  }
}
