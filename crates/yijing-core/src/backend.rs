//! The `DivinationBackend` trait: the remote service the workbench talks to.
//!
//! The HTTP client in `yijing-cli` implements it; tests substitute fakes.

use std::future::Future;

use crate::{
  chat::{ChatRequest, ChatResponse},
  divination::DivinationResponse,
  language::Language,
};

// ─── Request type ────────────────────────────────────────────────────────────

/// Everything needed to issue one divination call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivinationRequest {
  pub question:      String,
  pub language:      Language,
  pub include_najia: bool,
  /// Six classical line values; `None` lets the backend draw the lines.
  pub lines:         Option<Vec<u8>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the remote divination service.
///
/// All methods return `Send` futures so calls can be spawned onto a
/// multi-threaded runtime.
pub trait DivinationBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `GET /health`. Transport failures read as `false`.
  fn health(&self) -> impl Future<Output = bool> + Send + '_;

  /// `POST /api/divination`: the backend draws the lines.
  fn divine(
    &self,
    question: String,
    language: Language,
    include_najia: bool,
  ) -> impl Future<Output = Result<DivinationResponse, Self::Error>> + Send + '_;

  /// `POST /api/divination/manual`: interpret caller-supplied lines.
  fn divine_manual(
    &self,
    question: String,
    lines: Vec<u8>,
    language: Language,
    include_najia: bool,
  ) -> impl Future<Output = Result<DivinationResponse, Self::Error>> + Send + '_;

  /// `GET /api/divination/help`: free-form help payload.
  fn help(
    &self,
  ) -> impl Future<Output = Result<serde_json::Value, Self::Error>> + Send + '_;

  /// `POST /api/divination/ai-chat`.
  fn chat(
    &self,
    request: ChatRequest,
  ) -> impl Future<Output = Result<ChatResponse, Self::Error>> + Send + '_;

  /// Route `request` to the manual endpoint when it carries lines, else to
  /// the automatic one.
  fn submit(
    &self,
    request: DivinationRequest,
  ) -> impl Future<Output = Result<DivinationResponse, Self::Error>> + Send + '_ {
    async move {
      let DivinationRequest { question, language, include_najia, lines } = request;
      match lines {
        Some(lines) => {
          self
            .divine_manual(question, lines, language, include_najia)
            .await
        }
        None => self.divine(question, language, include_najia).await,
      }
    }
  }
}
