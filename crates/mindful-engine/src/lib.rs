//! mindful-engine: headless core of the mindful chat client
//!
//! This crate provides everything below the UI layer:
//! - HTTP client for the chat backend (send, history, feedback, health)
//! - Conversation controller driving one turn at a time
//! - Feedback modal state and notifications
//! - Configuration and the local preference store (theme, session)

pub mod client;
pub mod config;
pub mod controller;
pub mod feedback;
pub mod message;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod theme;

// Re-export commonly used types
pub use client::{
    ChatBackend, ChatError, ChatReply, FeedbackAck, FeedbackRecord, HealthStatus, HistoryEntry,
    HttpChatClient, DEFAULT_HISTORY_LIMIT,
};
pub use config::{ClientConfig, ConfigError, API_URL_ENV};
pub use controller::{request_reply, ConversationController, TurnEvent, TurnOutcome, TurnState};
pub use feedback::{FeedbackModal, Notification, NotificationKind, NOTIFICATION_TTL};
pub use message::{ConversationId, Message, Sender, ERROR_REPLY};
pub use session::Session;
pub use store::{LocalStore, StoreError};
pub use theme::{ThemeMode, UnknownTheme};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
