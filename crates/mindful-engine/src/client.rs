//! HTTP client for the chat backend.
//!
//! [`ChatBackend`] is the seam the conversation controller talks to;
//! [`HttpChatClient`] implements it against the REST API:
//!
//! - `POST {base}/chat` `{message}` -> `{data: ChatReply}`
//! - `GET {base}/chat/history?limit=N` -> `{data: [HistoryEntry]}` (newest first)
//! - `POST {base}/feedback` `{conversation_id, helpful, comment}` -> ack
//! - `GET {base}/health` -> `{status, service}`
//!
//! Non-2xx responses carry `{error: "..."}`. Credentials are the backend's
//! session cookie, kept in a cookie jar.

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::message::ConversationId;
use crate::store::{LocalStore, StoreError};

/// Connection establishment bound, independent of the request timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of history entries requested.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Errors surfaced by chat operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// Non-success status, transport failure, malformed body or timeout.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// History could not be fetched. Only ever logged.
    #[error("History unavailable: {0}")]
    HistoryUnavailable(String),

    /// Feedback was submitted without a captured conversation id.
    #[error("No conversation selected for feedback")]
    FeedbackMissingTarget,

    /// The in-flight request was cancelled by the user.
    #[error("Request cancelled")]
    Cancelled,

    /// The configured backend URL is unusable.
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Successful reply to a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub is_crisis: bool,
}

/// One prior exchange as returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: ConversationId,
    pub message: String,
    pub response: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub is_crisis: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Feedback for one exchange. Built at submission time only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub conversation_id: ConversationId,
    pub helpful: bool,
    #[serde(default)]
    pub comment: String,
}

/// Acknowledgement of a feedback submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Backend health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

/// Operations the conversation layer needs from a chat backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one user message. No validation of `text` happens here.
    async fn send_message(&self, text: &str) -> Result<ChatReply, ChatError>;

    /// Fetch up to `limit` prior exchanges, newest first.
    ///
    /// Best effort: failures yield an empty list.
    async fn get_history(&self, limit: usize) -> Vec<HistoryEntry>;

    /// Submit feedback for one exchange.
    async fn send_feedback(&self, record: &FeedbackRecord) -> Result<FeedbackAck, ChatError>;

    /// Probe the backend's health endpoint.
    async fn health(&self) -> Result<HealthStatus, ChatError>;
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// [`ChatBackend`] over HTTP with cookie-based session credentials.
pub struct HttpChatClient {
    client: Client,
    base: Url,
    base_url: String,
    jar: Arc<Jar>,
}

impl HttpChatClient {
    /// Build a client for the configured backend.
    pub fn new(config: &ClientConfig) -> Result<Self, ChatError> {
        let base_url = config.base_url().to_string();
        let base = Url::parse(&base_url).map_err(|e| ChatError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ChatError::RequestFailed(format!("HTTP client setup: {e}")))?;

        Ok(Self {
            client,
            base,
            base_url,
            jar,
        })
    }

    /// Backend root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current session cookies as a `Cookie` header value.
    pub fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Seed the cookie jar from a previously saved `Cookie` header value.
    pub fn restore_session_cookie(&self, cookie: &str) {
        for pair in cookie.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, &self.base);
        }
    }

    /// Resume the backend session stored under `key`, if any.
    pub fn load_session(&self, store: &LocalStore, key: &str) {
        if let Some(cookie) = store.get(key) {
            debug!("Restoring saved backend session");
            self.restore_session_cookie(cookie);
        }
    }

    /// Save the current backend session under `key`.
    pub fn save_session(&self, store: &mut LocalStore, key: &str) -> Result<(), StoreError> {
        match self.session_cookie() {
            Some(cookie) if store.get(key) != Some(cookie.as_str()) => {
                info!("Backend session saved");
                store.set(key, cookie)
            }
            _ => Ok(()),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn fetch_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, ChatError> {
        let url = self.endpoint("chat/history");
        debug!(%url, limit, "GET history");

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| ChatError::HistoryUnavailable(describe_transport_error(&e)))?;

        if !response.status().is_success() {
            return Err(ChatError::HistoryUnavailable(format!(
                "status {}",
                response.status().as_u16()
            )));
        }

        let envelope: DataEnvelope<Vec<HistoryEntry>> = response
            .json()
            .await
            .map_err(|e| ChatError::HistoryUnavailable(e.to_string()))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn send_message(&self, text: &str) -> Result<ChatReply, ChatError> {
        let url = self.endpoint("chat");
        debug!(%url, chars = text.chars().count(), "POST chat message");

        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest { message: text })
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(describe_transport_error(&e)))?;

        if !response.status().is_success() {
            let reason = failure_reason(response, "Failed to send message").await;
            warn!(%reason, "Chat request rejected");
            return Err(ChatError::RequestFailed(reason));
        }

        let envelope: DataEnvelope<ChatReply> = response
            .json()
            .await
            .map_err(|e| ChatError::RequestFailed(format!("Malformed reply: {e}")))?;

        debug!(
            conversation_id = %envelope.data.conversation_id,
            intent = envelope.data.intent.as_deref().unwrap_or("-"),
            is_crisis = envelope.data.is_crisis,
            "Chat reply received"
        );
        Ok(envelope.data)
    }

    async fn get_history(&self, limit: usize) -> Vec<HistoryEntry> {
        match self.fetch_history(limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Continuing without history");
                Vec::new()
            }
        }
    }

    async fn send_feedback(&self, record: &FeedbackRecord) -> Result<FeedbackAck, ChatError> {
        let url = self.endpoint("feedback");
        debug!(%url, conversation_id = %record.conversation_id, helpful = record.helpful, "POST feedback");

        let response = self
            .client
            .post(&url)
            .json(record)
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(describe_transport_error(&e)))?;

        if !response.status().is_success() {
            let reason = failure_reason(response, "Failed to send feedback").await;
            warn!(%reason, "Feedback rejected");
            return Err(ChatError::RequestFailed(reason));
        }

        // The ack body is informational; an unexpected shape is not a failure.
        Ok(response.json().await.unwrap_or_default())
    }

    async fn health(&self) -> Result<HealthStatus, ChatError> {
        let url = self.endpoint("health");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ChatError::RequestFailed(describe_transport_error(&e)))?;

        if !response.status().is_success() {
            let reason = failure_reason(response, "Health check failed").await;
            return Err(ChatError::RequestFailed(reason));
        }

        response
            .json()
            .await
            .map_err(|e| ChatError::RequestFailed(format!("Malformed health report: {e}")))
    }
}

/// Prefer the backend's `error` field, else `fallback`.
async fn failure_reason(response: Response, fallback: &str) -> String {
    let status = response.status().as_u16();
    match response.json::<ErrorBody>().await {
        Ok(ErrorBody { error: Some(error) }) if !error.is_empty() => error,
        _ => {
            debug!(status, "Error body without message");
            fallback.to_string()
        }
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("cannot connect to backend: {e}")
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_parses_backend_envelope() {
        let body = r#"{"success": true, "data": {"response": "Hi!", "conversation_id": 12, "intent": "general", "is_crisis": false}}"#;
        let envelope: DataEnvelope<ChatReply> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.response, "Hi!");
        assert_eq!(envelope.data.conversation_id, ConversationId::Numeric(12));
        assert_eq!(envelope.data.intent.as_deref(), Some("general"));
    }

    #[test]
    fn test_feedback_record_wire_shape() {
        let record = FeedbackRecord {
            conversation_id: "c1".into(),
            helpful: true,
            comment: String::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"conversation_id": "c1", "helpful": true, "comment": ""})
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig {
            api_base_url: "not a url".into(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            HttpChatClient::new(&config),
            Err(ChatError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_session_cookie_roundtrip_through_jar() {
        let client = HttpChatClient::new(&ClientConfig::default()).unwrap();
        assert!(client.session_cookie().is_none());

        client.restore_session_cookie("session=abc123");
        assert_eq!(client.session_cookie().as_deref(), Some("session=abc123"));
    }
}
