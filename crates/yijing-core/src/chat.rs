//! AI chat messages and the request/response bodies of the chat endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{divination::DivinationResult, hexagram::Hexagram};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  User,
  Assistant,
}

/// One entry in the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub id:        Uuid,
  pub role:      ChatRole,
  pub content:   String,
  pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
  pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4(),
      role,
      content: content.into(),
      timestamp: Utc::now(),
    }
  }

  pub fn turn(&self) -> ConversationTurn {
    ConversationTurn { role: self.role, content: self.content.clone() }
  }
}

/// A prior turn as the chat endpoint expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
  pub role:    ChatRole,
  pub content: String,
}

/// Snapshot of the divination the conversation is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexagramContext {
  pub question:          String,
  pub original_hexagram: Hexagram,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub changed_hexagram:  Option<Hexagram>,
  pub interpretation:    String,
}

impl From<&DivinationResult> for HexagramContext {
  fn from(r: &DivinationResult) -> Self {
    Self {
      question:          r.question.clone(),
      original_hexagram: r.original_hexagram.clone(),
      changed_hexagram:  r.changed_hexagram.clone(),
      interpretation:    r.interpretation.clone(),
    }
  }
}

/// `POST /api/divination/ai-chat` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
  pub message:              String,
  pub hexagram_context:     HexagramContext,
  pub conversation_history: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
  pub response: String,
}
