//! Transcript messages and conversation identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::client::{ChatReply, HistoryEntry};

/// Text shown in place of a bot reply when a turn fails.
pub const ERROR_REPLY: &str = "Xin lỗi, đã xảy ra lỗi. Vui lòng thử lại sau.";

/// Backend-assigned identifier of one exchange.
///
/// The reference backend hands out integers, other deployments strings.
/// The id is sent back in the shape it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversationId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl FromStr for ConversationId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_string()), Self::Numeric))
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A single rendered message. Never mutated after it joins a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default)]
    pub is_crisis: bool,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    /// Create a message typed by the user.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            conversation_id: None,
            intent: None,
            is_crisis: false,
            is_error: false,
        }
    }

    /// Create a bot message from a backend reply.
    pub fn bot(reply: &ChatReply) -> Self {
        Self {
            text: reply.response.clone(),
            sender: Sender::Bot,
            timestamp: Utc::now(),
            conversation_id: Some(reply.conversation_id.clone()),
            intent: reply.intent.clone(),
            is_crisis: reply.is_crisis,
            is_error: false,
        }
    }

    /// Create the error-tagged bot message shown after a failed turn.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            timestamp: Utc::now(),
            conversation_id: None,
            intent: None,
            is_crisis: false,
            is_error: true,
        }
    }

    /// Expand a history entry into its user message and bot reply.
    pub fn from_history(entry: &HistoryEntry) -> [Self; 2] {
        let timestamp = entry
            .created_at
            .as_deref()
            .and_then(parse_backend_timestamp)
            .unwrap_or_else(Utc::now);

        let mut user = Self::user(entry.message.clone());
        user.timestamp = timestamp;

        let bot = Self {
            text: entry.response.clone(),
            sender: Sender::Bot,
            timestamp,
            conversation_id: Some(entry.id.clone()),
            intent: entry.intent.clone(),
            is_crisis: entry.is_crisis,
            is_error: false,
        };

        [user, bot]
    }

    /// Whether a feedback action should be offered for this message.
    pub fn accepts_feedback(&self) -> bool {
        self.sender == Sender::Bot && !self.is_error && self.conversation_id.is_some()
    }
}

/// Parse the backend's `created_at`, which may lack a UTC offset.
fn parse_backend_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
