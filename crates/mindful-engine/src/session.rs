//! Conversation session state.

use crate::client::ChatReply;
use crate::message::ConversationId;

/// The last conversation the backend assigned.
///
/// Immutable: each successful send produces the next session value, a failed
/// send keeps the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    conversation_id: Option<ConversationId>,
}

impl Session {
    /// A session with no conversation yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the most recent exchange, if any.
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    /// Session after a successful reply.
    #[must_use]
    pub fn advance(&self, reply: &ChatReply) -> Self {
        Self {
            conversation_id: Some(reply.conversation_id.clone()),
        }
    }
}
