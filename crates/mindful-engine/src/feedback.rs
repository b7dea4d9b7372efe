//! Feedback modal state and transient notifications.
//!
//! The modal is scoped to the conversation id captured when it was opened.
//! Submitting takes that id out of the modal, so it is cleared whatever the
//! outcome and a second submission cannot reach a stale target.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::client::{ChatBackend, ChatError, FeedbackAck, FeedbackRecord};
use crate::message::{ConversationId, Message};

/// Shown after feedback was accepted.
pub const FEEDBACK_THANKS: &str = "Cảm ơn bạn đã đánh giá!";

/// Shown when feedback could not be delivered.
pub const FEEDBACK_FAILED: &str = "Không thể gửi đánh giá. Vui lòng thử lại.";

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A short-lived message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub kind: NotificationKind,
    pub created_at: Instant,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NotificationKind::Success,
            created_at: Instant::now(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NotificationKind::Error,
            created_at: Instant::now(),
        }
    }

    /// Whether the notification should no longer be shown at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= NOTIFICATION_TTL
    }
}

/// State of the feedback modal.
#[derive(Debug, Clone, Default)]
pub struct FeedbackModal {
    visible: bool,
    target: Option<ConversationId>,
    /// Optional free-text comment.
    pub comment: String,
}

impl FeedbackModal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the modal for a message. Refused for messages without a
    /// conversation id (user messages, error replies).
    pub fn open(&mut self, message: &Message) -> bool {
        match (&message.conversation_id, message.accepts_feedback()) {
            (Some(id), true) => {
                self.open_for(id.clone());
                true
            }
            _ => {
                debug!("Feedback not available for this message");
                false
            }
        }
    }

    /// Open the modal for a known conversation id.
    pub fn open_for(&mut self, conversation_id: ConversationId) {
        self.visible = true;
        self.target = Some(conversation_id);
        self.comment.clear();
    }

    /// Close without submitting.
    pub fn close(&mut self) {
        self.visible = false;
        self.target = None;
        self.comment.clear();
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    /// Submission taken, waiting for the backend.
    pub fn is_pending(&self) -> bool {
        self.visible && self.target.is_none()
    }

    /// Conversation the modal currently targets.
    pub fn target(&self) -> Option<&ConversationId> {
        self.target.as_ref()
    }

    /// Take the captured target and build the record to send.
    pub fn prepare(&mut self, helpful: bool) -> Result<FeedbackRecord, ChatError> {
        let conversation_id = self.target.take().ok_or(ChatError::FeedbackMissingTarget)?;
        Ok(FeedbackRecord {
            conversation_id,
            helpful,
            comment: self.comment.trim().to_string(),
        })
    }

    /// Record the backend's answer and produce the notification to show.
    ///
    /// Success closes the modal. Failure also closes it; the user can open
    /// it again from the message.
    pub fn finish(&mut self, result: &Result<FeedbackAck, ChatError>) -> Notification {
        self.close();
        match result {
            Ok(_) => {
                info!("Feedback delivered");
                Notification::success(FEEDBACK_THANKS)
            }
            Err(e) => {
                warn!(error = %e, "Feedback failed");
                Notification::error(FEEDBACK_FAILED)
            }
        }
    }

    /// Submit feedback inline. `None` when no target was captured, in which
    /// case no request is made.
    pub async fn submit<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        helpful: bool,
    ) -> Option<Notification> {
        let record = match self.prepare(helpful) {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Feedback submission ignored");
                return None;
            }
        };
        let result = backend.send_feedback(&record).await;
        Some(self.finish(&result))
    }
}
