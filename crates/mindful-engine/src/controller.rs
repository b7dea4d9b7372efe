//! Conversation controller: the state machine around one chat turn.
//!
//! ```text
//!  Idle --Submit--> Sending --Dispatched--> AwaitingResponse --Succeeded--> Idle
//!                                                   |
//!                                                 Failed
//!                                                   v
//!                                            ErrorDisplayed --Acknowledged--> Idle
//! ```
//!
//! The input stays locked whenever the state is not [`TurnState::Idle`], so a
//! controller never has more than one request in flight.
//!
//! Two ways to drive a turn:
//! - the step API ([`ConversationController::submit`],
//!   [`ConversationController::dispatched`], [`ConversationController::complete`])
//!   for event loops that run the request on their own task;
//! - [`ConversationController::send`], which runs the whole turn inline.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::client::{ChatBackend, ChatError, ChatReply, HistoryEntry};
use crate::config::ClientConfig;
use crate::message::{Message, ERROR_REPLY};
use crate::session::Session;

/// Phase of the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    /// User message echoed, request not yet started.
    Sending,
    /// Request in flight, typing indicator visible.
    AwaitingResponse,
    /// Error reply shown, about to return to idle.
    ErrorDisplayed,
}

/// Inputs to the turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    Submit,
    Dispatched,
    Succeeded,
    Failed,
    Acknowledged,
}

impl TurnState {
    /// Transition table. `None` means the event is not allowed here.
    pub fn next(self, event: TurnEvent) -> Option<Self> {
        match (self, event) {
            (Self::Idle, TurnEvent::Submit) => Some(Self::Sending),
            (Self::Sending, TurnEvent::Dispatched) => Some(Self::AwaitingResponse),
            (Self::AwaitingResponse, TurnEvent::Succeeded) => Some(Self::Idle),
            (Self::AwaitingResponse, TurnEvent::Failed) => Some(Self::ErrorDisplayed),
            (Self::ErrorDisplayed, TurnEvent::Acknowledged) => Some(Self::Idle),
            _ => None,
        }
    }

    /// Whether input controls are locked in this state.
    pub fn locks_input(self) -> bool {
        self != Self::Idle
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Empty input or a turn already running; nothing changed.
    Ignored,
    /// The backend replied.
    Replied(ChatReply),
    /// The turn failed and an error message was shown.
    Failed(ChatError),
}

/// Run one send request with an upper bound on its duration.
pub async fn request_reply<B: ChatBackend + ?Sized>(
    backend: &B,
    text: &str,
    limit: Duration,
) -> Result<ChatReply, ChatError> {
    match timeout(limit, backend.send_message(text)).await {
        Ok(result) => result,
        Err(_) => Err(ChatError::RequestFailed(format!(
            "no reply within {}s",
            limit.as_secs()
        ))),
    }
}

/// Owns the transcript, the session and the input lock.
pub struct ConversationController<B: ChatBackend + ?Sized> {
    backend: Arc<B>,
    transcript: Vec<Message>,
    state: TurnState,
    session: Session,
    typing: bool,
    focus_requested: bool,
    request_timeout: Duration,
    history_limit: usize,
}

impl<B: ChatBackend + ?Sized> ConversationController<B> {
    /// Create a controller for `backend` using the config's timeout and history size.
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> Self {
        Self {
            backend,
            transcript: Vec::new(),
            state: TurnState::Idle,
            session: Session::new(),
            typing: false,
            focus_requested: false,
            request_timeout: config.request_timeout(),
            history_limit: config.history_limit,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, limit: Duration) -> Self {
        self.request_timeout = limit;
        self
    }

    /// Shared handle to the backend, for running requests on another task.
    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Whether the typing indicator should be visible.
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Whether the input field and send control accept input.
    pub fn is_input_enabled(&self) -> bool {
        !self.state.locks_input()
    }

    /// Returns true once after a turn finished, to move focus back to input.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    fn transition(&mut self, event: TurnEvent) -> bool {
        match self.state.next(event) {
            Some(next) => {
                debug!(from = ?self.state, to = ?next, ?event, "Turn transition");
                self.state = next;
                true
            }
            None => {
                debug!(state = ?self.state, ?event, "Ignoring event");
                false
            }
        }
    }

    /// Start a turn: lock input and echo the user's message.
    ///
    /// Returns the text to send, or `None` when the input is blank or a turn
    /// is already running. The caller clears its input field on `Some`.
    pub fn submit(&mut self, raw: &str) -> Option<String> {
        let text = raw.trim();
        if text.is_empty() || self.state != TurnState::Idle {
            return None;
        }
        if !self.transition(TurnEvent::Submit) {
            return None;
        }

        self.transcript.push(Message::user(text));
        Some(text.to_string())
    }

    /// The request is on its way: show the typing indicator.
    pub fn dispatched(&mut self) {
        if self.transition(TurnEvent::Dispatched) {
            self.typing = true;
        }
    }

    /// Finish the in-flight turn with the backend's result.
    pub fn complete(&mut self, result: Result<ChatReply, ChatError>) -> TurnOutcome {
        match result {
            Ok(reply) => {
                if !self.transition(TurnEvent::Succeeded) {
                    return TurnOutcome::Ignored;
                }
                self.typing = false;
                self.transcript.push(Message::bot(&reply));
                self.session = self.session.advance(&reply);
                info!(conversation_id = %reply.conversation_id, "Turn completed");
                self.focus_requested = true;
                TurnOutcome::Replied(reply)
            }
            Err(error) => {
                if !self.transition(TurnEvent::Failed) {
                    return TurnOutcome::Ignored;
                }
                self.typing = false;
                self.transcript.push(Message::error(ERROR_REPLY));
                warn!(%error, "Turn failed");
                self.transition(TurnEvent::Acknowledged);
                self.focus_requested = true;
                TurnOutcome::Failed(error)
            }
        }
    }

    /// Abandon the in-flight request. The turn ends as a failure.
    pub fn cancel(&mut self) -> TurnOutcome {
        if self.state == TurnState::Sending {
            self.dispatched();
        }
        self.complete(Err(ChatError::Cancelled))
    }

    /// Run a complete turn against the backend.
    pub async fn send(&mut self, raw: &str) -> TurnOutcome {
        let Some(text) = self.submit(raw) else {
            return TurnOutcome::Ignored;
        };
        self.dispatched();

        let result = request_reply(&*self.backend, &text, self.request_timeout).await;
        self.complete(result)
    }

    /// Put prior exchanges (newest first, as the backend sends them) at the
    /// start of the transcript in chronological order.
    pub fn apply_history(&mut self, entries: Vec<HistoryEntry>) -> usize {
        let restored: Vec<Message> = entries
            .iter()
            .rev()
            .flat_map(Message::from_history)
            .collect();
        let count = entries.len();
        self.transcript.splice(0..0, restored);
        debug!(count, "History applied");
        count
    }

    /// Fetch history from the backend and apply it. Never fails.
    pub async fn load_history(&mut self) -> usize {
        let entries = self.backend.get_history(self.history_limit).await;
        self.apply_history(entries)
    }

    /// Number of history entries fetched on start-up.
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }
}
