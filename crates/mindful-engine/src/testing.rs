//! Scripted in-memory backend for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::{
    ChatBackend, ChatError, ChatReply, FeedbackAck, FeedbackRecord, HealthStatus, HistoryEntry,
};

#[derive(Default)]
struct Recorded {
    replies: VecDeque<Result<ChatReply, ChatError>>,
    fallback: Option<Result<ChatReply, ChatError>>,
    feedback_result: Option<ChatError>,
    history: Vec<HistoryEntry>,
    sent: Vec<String>,
    feedback: Vec<FeedbackRecord>,
    history_limits: Vec<usize>,
}

/// Records every call and answers from a script.
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<Recorded>>,
    delay: Option<Duration>,
}

impl MockBackend {
    /// Always reply with `reply`.
    pub fn replying(reply: ChatReply) -> Self {
        let backend = Self::default();
        backend.inner.lock().unwrap().fallback = Some(Ok(reply));
        backend
    }

    /// Always fail with `error`.
    pub fn failing(error: ChatError) -> Self {
        let backend = Self::default();
        backend.inner.lock().unwrap().fallback = Some(Err(error));
        backend
    }

    /// Answer sends in order; later sends fail.
    pub fn scripted(replies: Vec<Result<ChatReply, ChatError>>) -> Self {
        let backend = Self::default();
        backend.inner.lock().unwrap().replies = replies.into();
        backend
    }

    #[must_use]
    pub fn with_history(self, history: Vec<HistoryEntry>) -> Self {
        self.inner.lock().unwrap().history = history;
        self
    }

    #[must_use]
    pub fn with_feedback_error(self, error: ChatError) -> Self {
        self.inner.lock().unwrap().feedback_result = Some(error);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn send_calls(&self) -> usize {
        self.inner.lock().unwrap().sent.len()
    }

    pub fn sent_messages(&self) -> Vec<String> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn feedback(&self) -> Vec<FeedbackRecord> {
        self.inner.lock().unwrap().feedback.clone()
    }

    pub fn history_limits(&self) -> Vec<usize> {
        self.inner.lock().unwrap().history_limits.clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn send_message(&self, text: &str) -> Result<ChatReply, ChatError> {
        let result = {
            let mut inner = self.inner.lock().unwrap();
            inner.sent.push(text.to_string());
            match inner.replies.pop_front() {
                Some(result) => result,
                None => inner
                    .fallback
                    .clone()
                    .unwrap_or_else(|| Err(ChatError::RequestFailed("script exhausted".into()))),
            }
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn get_history(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut inner = self.inner.lock().unwrap();
        inner.history_limits.push(limit);
        inner.history.iter().take(limit).cloned().collect()
    }

    async fn send_feedback(&self, record: &FeedbackRecord) -> Result<FeedbackAck, ChatError> {
        let mut inner = self.inner.lock().unwrap();
        inner.feedback.push(record.clone());
        match inner.feedback_result.clone() {
            Some(error) => Err(error),
            None => Ok(FeedbackAck {
                success: true,
                message: Some("Thank you for your feedback!".into()),
            }),
        }
    }

    async fn health(&self) -> Result<HealthStatus, ChatError> {
        Ok(HealthStatus {
            status: "healthy".into(),
            service: Some("mock".into()),
        })
    }
}
