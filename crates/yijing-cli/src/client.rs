//! Async HTTP client wrapping the divination backend's JSON API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use yijing_core::{
  backend::DivinationBackend,
  chat::{ChatRequest, ChatResponse},
  divination::DivinationResponse,
  language::Language,
};

/// Connection settings for the backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("{context} failed: {source}")]
  Request {
    context: &'static str,
    #[source]
    source:  reqwest::Error,
  },

  /// Non-success status; carries the response body text.
  #[error("{context} → {status}: {body}")]
  Status {
    context: &'static str,
    status:  StatusCode,
    body:    String,
  },
}

/// Async HTTP client for the divination REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Serialize)]
struct QuestionBody<'a> {
  question: &'a str,
}

#[derive(Serialize)]
struct ManualBody<'a> {
  question: &'a str,
  lines:    &'a [u8],
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(ClientError::Build)?;
    Ok(Self { client, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// Send `req`, map a non-success status to [`ClientError::Status`], and
  /// decode the JSON body.
  async fn send_json<T: serde::de::DeserializeOwned>(
    &self,
    context: &'static str,
    req: reqwest::RequestBuilder,
  ) -> Result<T, ClientError> {
    let resp = req
      .send()
      .await
      .map_err(|source| ClientError::Request { context, source })?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      tracing::debug!(%status, context, "backend returned an error status");
      return Err(ClientError::Status { context, status, body });
    }
    resp
      .json()
      .await
      .map_err(|source| ClientError::Request { context, source })
  }

  fn divination_query(language: Language, include_najia: bool) -> [(&'static str, String); 2] {
    [
      ("language", language.code().to_owned()),
      ("include_najia", include_najia.to_string()),
    ]
  }
}

impl DivinationBackend for ApiClient {
  type Error = ClientError;

  /// `GET /health`
  async fn health(&self) -> bool {
    match self.client.get(self.url("/health")).send().await {
      Ok(resp) => resp.status().is_success(),
      Err(e) => {
        tracing::debug!(error = %e, "health check failed");
        false
      }
    }
  }

  /// `POST /api/divination?language=<code>&include_najia=<bool>`
  async fn divine(
    &self,
    question: String,
    language: Language,
    include_najia: bool,
  ) -> Result<DivinationResponse, ClientError> {
    tracing::debug!(%language, include_najia, "POST /api/divination");
    let req = self
      .client
      .post(self.url("/api/divination"))
      .query(&Self::divination_query(language, include_najia))
      .json(&QuestionBody { question: question.trim() });
    self.send_json("POST /api/divination", req).await
  }

  /// `POST /api/divination/manual?include_najia=<bool>&language=<code>`
  async fn divine_manual(
    &self,
    question: String,
    lines: Vec<u8>,
    language: Language,
    include_najia: bool,
  ) -> Result<DivinationResponse, ClientError> {
    tracing::debug!(%language, include_najia, ?lines, "POST /api/divination/manual");
    let req = self
      .client
      .post(self.url("/api/divination/manual"))
      .query(&Self::divination_query(language, include_najia))
      .json(&ManualBody { question: question.trim(), lines: &lines });
    self.send_json("POST /api/divination/manual", req).await
  }

  /// `GET /api/divination/help`
  async fn help(&self) -> Result<serde_json::Value, ClientError> {
    let req = self.client.get(self.url("/api/divination/help"));
    self.send_json("GET /api/divination/help", req).await
  }

  /// `POST /api/divination/ai-chat`
  async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ClientError> {
    tracing::debug!(
      history = request.conversation_history.len(),
      "POST /api/divination/ai-chat"
    );
    let req = self
      .client
      .post(self.url("/api/divination/ai-chat"))
      .json(&request);
    self.send_json("POST /api/divination/ai-chat", req).await
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
  };

  use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
  };
  use chrono::Utc;
  use serde_json::{Value, json};
  use tokio::net::TcpListener;
  use yijing_core::{
    chat::{ChatMessage, ChatRole, HexagramContext},
    divination::DivinationResult,
  };

  use super::*;

  /// Every request the fake backend saw: `(path, query, body)`.
  type Seen = Arc<Mutex<Vec<(String, HashMap<String, String>, Value)>>>;

  fn divination_body(question: &str) -> Value {
    let lines: Vec<Value> = (1..=6)
      .map(|p| json!({"position": p, "type": "yang", "changing": p == 3}))
      .collect();
    json!({
      "question": question,
      "originalHexagram": {"number": 1, "name": "乾卦", "chineseName": "乾為天", "symbol": "☰",
                           "upperTrigram": "111", "lowerTrigram": "111"},
      "changedHexagram": {"number": 13, "name": "同人", "chineseName": "天火同人", "symbol": "䷌"},
      "lines": lines,
      "timestamp": "2024-05-01T08:30:00",
      "interpretation": "…"
    })
  }

  async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
  }

  async fn fake_backend() -> (ApiClient, Seen) {
    let seen: Seen = Arc::default();

    async fn divination(
      State(seen): State<Seen>,
      Query(q): Query<HashMap<String, String>>,
      Json(body): Json<Value>,
    ) -> Json<Value> {
      let question = body["question"].as_str().unwrap_or_default().to_owned();
      seen.lock().unwrap().push(("/api/divination".into(), q, body));
      Json(divination_body(&question))
    }

    async fn manual(
      State(seen): State<Seen>,
      Query(q): Query<HashMap<String, String>>,
      Json(body): Json<Value>,
    ) -> Json<Value> {
      let question = body["question"].as_str().unwrap_or_default().to_owned();
      seen.lock().unwrap().push(("/api/divination/manual".into(), q, body));
      Json(divination_body(&question))
    }

    async fn chat(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
      let reply = format!("reply to {}", body["message"].as_str().unwrap_or_default());
      seen
        .lock()
        .unwrap()
        .push(("/api/divination/ai-chat".into(), HashMap::new(), body));
      Json(json!({ "response": reply }))
    }

    let router = Router::new()
      .route("/health", get(|| async { Json(json!({"status": "healthy"})) }))
      .route("/api/divination", post(divination))
      .route("/api/divination/manual", post(manual))
      .route(
        "/api/divination/help",
        get(|| async { Json(json!({"methods": ["coins", "manual"]})) }),
      )
      .route("/api/divination/ai-chat", post(chat))
      .with_state(seen.clone());

    let base_url = serve(router).await;
    let client = ApiClient::new(ApiConfig { base_url, timeout: Duration::from_secs(5) })
      .unwrap();
    (client, seen)
  }

  #[tokio::test]
  async fn divine_sends_language_najia_and_trimmed_question() {
    let (client, seen) = fake_backend().await;
    let resp = client
      .divine("  今天适合投资吗？ ".into(), Language::En, true)
      .await
      .unwrap();
    assert_eq!(resp.question, "今天适合投资吗？");
    assert_eq!(resp.lines.len(), 6);

    let seen = seen.lock().unwrap();
    let (path, query, body) = &seen[0];
    assert_eq!(path, "/api/divination");
    assert_eq!(query["language"], "en");
    assert_eq!(query["include_najia"], "true");
    assert_eq!(body["question"], "今天适合投资吗？");
  }

  #[tokio::test]
  async fn manual_divination_sends_lines() {
    let (client, seen) = fake_backend().await;
    client
      .divine_manual("q".into(), vec![7, 8, 6, 7, 9, 8], Language::Zh, false)
      .await
      .unwrap();

    let seen = seen.lock().unwrap();
    let (path, query, body) = &seen[0];
    assert_eq!(path, "/api/divination/manual");
    assert_eq!(query["language"], "zh");
    assert_eq!(query["include_najia"], "false");
    assert_eq!(body["lines"], json!([7, 8, 6, 7, 9, 8]));
  }

  #[tokio::test]
  async fn response_normalises_into_result() {
    let (client, _) = fake_backend().await;
    let resp = client.divine("q".into(), Language::Zh, false).await.unwrap();
    let result = DivinationResult::from_response(resp, "匿名".into(), String::new());
    assert_eq!(result.change_info.changing_lines, vec![3]);
    assert!(result.changed_hexagram.is_some());
  }

  #[tokio::test]
  async fn chat_round_trip() {
    let (client, seen) = fake_backend().await;
    let result = DivinationResult::fallback("q", String::new(), "i".into(), Utc::now());
    let resp = client
      .chat(ChatRequest {
        message:              "why?".into(),
        hexagram_context:     HexagramContext::from(&result),
        conversation_history: vec![ChatMessage::new(ChatRole::User, "hi").turn()],
      })
      .await
      .unwrap();
    assert_eq!(resp.response, "reply to why?");

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].2["conversation_history"][0]["content"], "hi");
  }

  #[tokio::test]
  async fn help_and_health() {
    let (client, _) = fake_backend().await;
    assert!(client.health().await);
    let help = client.help().await.unwrap();
    assert_eq!(help["methods"][0], "coins");
  }

  #[tokio::test]
  async fn error_status_carries_body() {
    let router = Router::new().route(
      "/api/divination",
      post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base_url = serve(router).await;
    let client = ApiClient::new(ApiConfig { base_url, timeout: Duration::from_secs(5) })
      .unwrap();

    match client.divine("q".into(), Language::Zh, false).await {
      Err(ClientError::Status { status, body, .. }) => {
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "boom");
      }
      other => panic!("expected status error, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn unreachable_backend_is_unhealthy() {
    // Bind and drop to find a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(ApiConfig {
      base_url: format!("http://{addr}"),
      timeout:  Duration::from_secs(2),
    })
    .unwrap();
    assert!(!client.health().await);
    assert!(matches!(
      client.divine("q".into(), Language::Zh, false).await,
      Err(ClientError::Request { .. })
    ));
  }
}
