//! The AI chat transcript about the current divination.

use yijing_core::{
  backend::DivinationBackend,
  chat::{ChatMessage, ChatRequest, ChatResponse, ChatRole, HexagramContext},
  divination::DivinationResult,
};

use crate::{i18n::Strings, notice::Notices};

/// A chat request ready to be sent, tagged with the transcript epoch it
/// belongs to.
#[derive(Debug, Clone)]
pub struct PendingChat {
  pub epoch:   u64,
  pub request: ChatRequest,
}

/// Append-only transcript plus the input line.
///
/// Only one request may be in flight. [`clear`](Self::clear) starts a new
/// epoch so a reply to the old transcript is dropped.
#[derive(Debug, Default)]
pub struct ChatPanel {
  messages:  Vec<ChatMessage>,
  pub input: String,
  in_flight: bool,
  epoch:     u64,
}

impl ChatPanel {
  pub fn messages(&self) -> &[ChatMessage] { &self.messages }

  pub fn is_waiting(&self) -> bool { self.in_flight }

  /// Append the user turn and build the request. `None` when `text` is
  /// blank, there is no result, or a reply is still pending.
  pub fn begin_send(
    &mut self,
    text: &str,
    result: Option<&DivinationResult>,
  ) -> Option<PendingChat> {
    let text = text.trim();
    let result = result?;
    if text.is_empty() || self.in_flight {
      return None;
    }

    let conversation_history = self.messages.iter().map(ChatMessage::turn).collect();
    self.messages.push(ChatMessage::new(ChatRole::User, text));
    self.in_flight = true;

    Some(PendingChat {
      epoch:   self.epoch,
      request: ChatRequest {
        message: text.to_owned(),
        hexagram_context: HexagramContext::from(result),
        conversation_history,
      },
    })
  }

  /// Send the input line, clearing it when a request was built.
  pub fn submit_input(&mut self, result: Option<&DivinationResult>) -> Option<PendingChat> {
    let text = self.input.clone();
    let pending = self.begin_send(&text, result)?;
    self.input.clear();
    Some(pending)
  }

  /// Apply a reply. Returns `false` when it belongs to a cleared transcript.
  pub fn complete(
    &mut self,
    epoch: u64,
    outcome: Result<ChatResponse, String>,
    notices: &mut Notices,
    strings: &Strings,
  ) -> bool {
    if epoch != self.epoch {
      tracing::debug!(epoch, current = self.epoch, "dropping reply to a cleared chat");
      return false;
    }
    self.in_flight = false;
    match outcome {
      Ok(resp) => self.messages.push(ChatMessage::new(ChatRole::Assistant, resp.response)),
      Err(e) => {
        tracing::warn!(error = %e, "chat request failed");
        notices.error(strings.chat_failed, e);
      }
    }
    true
  }

  /// Send `text` and wait for the reply.
  pub async fn send_message<B: DivinationBackend>(
    &mut self,
    backend: &B,
    text: &str,
    result: Option<&DivinationResult>,
    notices: &mut Notices,
    strings: &Strings,
  ) {
    let Some(PendingChat { epoch, request }) = self.begin_send(text, result) else {
      return;
    };
    let outcome = backend.chat(request).await.map_err(|e| e.to_string());
    self.complete(epoch, outcome, notices, strings);
  }

  pub fn clear(&mut self) {
    self.messages.clear();
    self.input.clear();
    self.in_flight = false;
    self.epoch += 1;
  }
}
