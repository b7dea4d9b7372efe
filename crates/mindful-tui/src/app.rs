//! Application state for the mindful TUI.
//!
//! `App` is synchronous: key actions mutate state and may return an
//! [`Effect`] that the run loop turns into a network task. Results come back
//! through the `on_*` methods.

use std::sync::Arc;
use std::time::Instant;

use mindful_engine::{
    ChatBackend, ChatError, ChatReply, ClientConfig, ConversationController, ConversationId,
    FeedbackAck, FeedbackModal, FeedbackRecord, HistoryEntry, LocalStore, Message, Notification,
    ThemeMode, TurnOutcome, TurnState,
};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use tracing::{debug, info, warn};

use crate::event::Action;
use crate::theme::{symbols, Theme};
use crate::widgets::{TextInputState, TranscriptState};

/// Work the run loop has to start on behalf of the app.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a chat message; the turn is already dispatched.
    Send(String),
    /// Abort the in-flight send.
    CancelTurn,
    /// Deliver feedback for the captured conversation.
    Feedback(FeedbackRecord),
}

/// Main application state.
pub struct App {
    pub should_quit: bool,
    pub show_help: bool,
    pub(crate) controller: ConversationController<dyn ChatBackend>,
    pub input: TextInputState,
    pub modal: FeedbackModal,
    /// Comment being typed in the feedback modal.
    pub comment: TextInputState,
    /// Choice highlighted in the feedback modal.
    pub helpful: bool,
    notification: Option<Notification>,
    theme_mode: ThemeMode,
    pub theme: Theme,
    store: LocalStore,
    config: ClientConfig,
    pub transcript_state: TranscriptState,
    /// Conversation the user moved the selection to, if any.
    selected: Option<ConversationId>,
    typing_since: Option<Instant>,
    seen_messages: usize,
}

impl App {
    /// Create the app. The theme is read from the store.
    pub fn new(backend: Arc<dyn ChatBackend>, config: ClientConfig, store: LocalStore) -> Self {
        let theme_mode = ThemeMode::load(&store, &config.theme_key);
        let controller = ConversationController::new(backend, &config);
        let transcript_state = TranscriptState::new(config.auto_scroll);
        Self {
            should_quit: false,
            show_help: false,
            controller,
            input: TextInputState::new(),
            modal: FeedbackModal::new(),
            comment: TextInputState::new(),
            helpful: true,
            notification: None,
            theme_mode,
            theme: Theme::for_mode(theme_mode),
            store,
            config,
            transcript_state,
            selected: None,
            typing_since: None,
            seen_messages: 0,
        }
    }

    pub fn controller(&self) -> &ConversationController<dyn ChatBackend> {
        &self.controller
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme_mode
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut LocalStore {
        &mut self.store
    }

    /// Index of the message feedback would target: the explicit selection,
    /// then the session's active conversation, then the most recent message
    /// that accepts feedback.
    pub fn selected(&self) -> Option<usize> {
        let transcript = self.controller.transcript();
        let position = |id: &ConversationId| {
            transcript
                .iter()
                .rposition(|m| m.accepts_feedback() && m.conversation_id.as_ref() == Some(id))
        };
        self.selected
            .as_ref()
            .and_then(position)
            .or_else(|| self.controller.session().conversation_id().and_then(position))
            .or_else(|| transcript.iter().rposition(Message::accepts_feedback))
    }

    /// Spinner frame while the typing indicator is visible.
    pub fn typing_frame(&self, now: Instant) -> Option<&'static str> {
        if !self.controller.is_typing() {
            return None;
        }
        let since = self.typing_since.unwrap_or(now);
        Some(symbols::spinner_frame(
            now.saturating_duration_since(since).as_millis(),
            self.config.typing_delay_ms,
        ))
    }

    /// Lines shown before the first message.
    pub fn welcome_lines(&self) -> Vec<Line<'static>> {
        let muted = Style::default().fg(self.theme.muted);
        let mut lines = vec![
            Line::from(Span::styled(
                "Xin chào! Mình là Mindful",
                Style::default()
                    .fg(self.theme.bot)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from("Mình luôn sẵn sàng lắng nghe. Hôm nay bạn cảm thấy thế nào?"),
            Line::default(),
        ];
        if !self.config.quick_actions.is_empty() {
            lines.push(Line::from(Span::styled("Câu hỏi nhanh:", muted)));
            for (i, prompt) in self.config.quick_actions.iter().take(9).enumerate() {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  Alt+{}  ", i + 1),
                        Style::default().fg(self.theme.primary),
                    ),
                    Span::raw(prompt.clone()),
                ]));
            }
        }
        lines
    }

    /// Handle a key action.
    pub fn handle_action(&mut self, action: Action) -> Option<Effect> {
        if action == Action::Quit {
            self.should_quit = true;
            return None;
        }

        if self.show_help {
            self.show_help = false;
            return None;
        }

        if self.modal.is_open() {
            return self.handle_modal_action(action);
        }

        match action {
            Action::Help => {
                self.show_help = true;
                None
            }
            Action::ToggleTheme => {
                self.toggle_theme();
                None
            }
            Action::Feedback => {
                self.open_feedback();
                None
            }
            Action::Cancel => {
                if self.controller.state() == TurnState::Idle {
                    None
                } else {
                    Some(Effect::CancelTurn)
                }
            }
            Action::Submit => self.submit_input(),
            Action::QuickAction(index) => self.quick_action(index),
            Action::SelectPrev => {
                self.move_selection(false);
                None
            }
            Action::SelectNext => {
                self.move_selection(true);
                None
            }
            Action::PageUp => {
                let page = self.transcript_state.viewport().max(1);
                self.transcript_state.scroll_up(page);
                None
            }
            Action::PageDown => {
                let page = self.transcript_state.viewport().max(1);
                self.transcript_state.scroll_down(page);
                None
            }
            _ => {
                if self.controller.is_input_enabled() {
                    self.edit_input(action);
                }
                None
            }
        }
    }

    fn edit_input(&mut self, action: Action) {
        match action {
            Action::Char(c) => self.insert_capped(c),
            Action::Newline => self.insert_capped('\n'),
            Action::Backspace => self.input.backspace(),
            Action::Delete => self.input.delete(),
            Action::Left => self.input.move_left(),
            Action::Right => self.input.move_right(),
            Action::Home => self.input.move_home(),
            Action::End => self.input.move_end(),
            Action::Up => self.input.history_prev(),
            Action::Down => self.input.history_next(),
            _ => {}
        }
    }

    fn insert_capped(&mut self, c: char) {
        if self.input.char_count() < self.config.max_message_length {
            self.input.insert(c);
        }
    }

    fn handle_modal_action(&mut self, action: Action) -> Option<Effect> {
        if self.modal.is_pending() {
            return None;
        }
        match action {
            Action::Cancel => {
                self.modal.close();
                self.comment.clear();
            }
            Action::Toggle | Action::Left | Action::Right => self.helpful = !self.helpful,
            Action::Submit => {
                self.modal.comment = self.comment.content().to_string();
                match self.modal.prepare(self.helpful) {
                    Ok(record) => return Some(Effect::Feedback(record)),
                    Err(e) => debug!(error = %e, "Feedback not sent"),
                }
            }
            Action::Char(c) => self.comment.insert(c),
            Action::Backspace => self.comment.backspace(),
            Action::Delete => self.comment.delete(),
            Action::Home => self.comment.move_home(),
            Action::End => self.comment.move_end(),
            _ => {}
        }
        None
    }

    /// Start a turn with the current input.
    pub fn submit_input(&mut self) -> Option<Effect> {
        let text = self.controller.submit(self.input.content())?;
        self.input.submit();
        self.controller.dispatched();
        self.typing_since = Some(Instant::now());
        self.after_transcript_change();
        Some(Effect::Send(text))
    }

    fn quick_action(&mut self, index: usize) -> Option<Effect> {
        if !self.controller.is_input_enabled() {
            return None;
        }
        let prompt = self.config.quick_actions.get(index)?.clone();
        self.input.clear();
        self.input.insert_str(&prompt);
        self.submit_input()
    }

    /// The send task finished.
    pub fn on_reply(&mut self, result: Result<ChatReply, ChatError>) -> TurnOutcome {
        let outcome = self.controller.complete(result);
        self.finish_turn();
        outcome
    }

    /// The send task was aborted.
    pub fn on_cancelled(&mut self) {
        self.controller.cancel();
        self.finish_turn();
    }

    fn finish_turn(&mut self) {
        self.typing_since = None;
        if self.controller.take_focus_request() {
            self.show_help = false;
        }
        self.after_transcript_change();
    }

    /// Start-up history arrived.
    pub fn on_history(&mut self, entries: Vec<HistoryEntry>) {
        let count = self.controller.apply_history(entries);
        if count > 0 {
            info!(count, "Restored conversation history");
        }
        self.after_transcript_change();
    }

    /// The feedback task finished.
    pub fn on_feedback(&mut self, result: Result<FeedbackAck, ChatError>) {
        self.notification = Some(self.modal.finish(&result));
        self.comment.clear();
    }

    /// Open the feedback modal for the selected message.
    pub fn open_feedback(&mut self) -> bool {
        let Some(index) = self.selected() else {
            debug!("No message to give feedback on");
            return false;
        };
        let Some(message) = self.controller.transcript().get(index) else {
            return false;
        };
        let opened = self.modal.open(message);
        if opened {
            self.comment.clear();
            self.helpful = true;
        }
        opened
    }

    fn move_selection(&mut self, forward: bool) {
        let transcript = self.controller.transcript();
        let current = self.selected();
        let mut candidates = transcript
            .iter()
            .enumerate()
            .filter(|(_, m)| m.accepts_feedback())
            .map(|(i, _)| i);

        let next = match (current, forward) {
            (Some(cur), false) => candidates.take_while(|&i| i < cur).last().or(Some(cur)),
            (Some(cur), true) => candidates.find(|&i| i > cur),
            (None, _) => None,
        };
        self.selected = next
            .and_then(|i| transcript.get(i))
            .and_then(|m| m.conversation_id.clone());
    }

    /// Flip between light and dark and persist the choice.
    pub fn toggle_theme(&mut self) {
        let next = self.theme_mode.toggled();
        if let Err(e) = next.save(&mut self.store, &self.config.theme_key) {
            warn!(error = %e, "Failed to persist theme");
        }
        self.theme_mode = next;
        self.theme = Theme::for_mode(next);
        info!(theme = %next, "Theme changed");
    }

    /// Periodic housekeeping: expire the notification.
    pub fn tick(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| n.is_expired(now))
        {
            self.notification = None;
        }
    }

    fn after_transcript_change(&mut self) {
        let len = self.controller.transcript().len();
        if len != self.seen_messages {
            self.seen_messages = len;
            if self.config.auto_scroll {
                self.transcript_state.scroll_to_bottom();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_app_with, render_app_to_string, reply};
    use mindful_engine::testing::MockBackend;
    use mindful_engine::{ConversationId, NotificationKind, Sender, ERROR_REPLY, NOTIFICATION_TTL};

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(Action::Char(c));
        }
    }

    #[test]
    fn test_submit_locks_input_and_echoes() {
        let (mut app, _dir) = create_test_app();
        type_text(&mut app, "  Xin chào  ");

        let effect = app.handle_action(Action::Submit);
        assert_eq!(effect, Some(Effect::Send("Xin chào".into())));
        assert!(app.input.is_empty());
        assert!(!app.controller().is_input_enabled());
        assert_eq!(app.controller().state(), TurnState::AwaitingResponse);
        assert!(app.typing_frame(Instant::now()).is_some());

        // Typing is ignored while the turn runs.
        type_text(&mut app, "x");
        assert!(app.input.is_empty());
        assert_eq!(app.handle_action(Action::Submit), None);

        let transcript = app.controller().transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].sender, Sender::User);
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let (mut app, _dir) = create_test_app();
        type_text(&mut app, "   ");
        assert_eq!(app.handle_action(Action::Submit), None);
        assert!(app.controller().transcript().is_empty());
        assert!(app.controller().is_input_enabled());
    }

    #[test]
    fn test_reply_unlocks_and_selects_latest() {
        let (mut app, _dir) = create_test_app();
        type_text(&mut app, "hello");
        app.handle_action(Action::Submit);

        let outcome = app.on_reply(Ok(reply("Hi!", "c1")));
        assert!(matches!(outcome, TurnOutcome::Replied(_)));
        assert!(app.controller().is_input_enabled());
        assert!(app.typing_frame(Instant::now()).is_none());
        assert_eq!(app.selected(), Some(1));
    }

    #[test]
    fn test_failure_shows_error_reply() {
        let (mut app, _dir) = create_test_app();
        type_text(&mut app, "hello");
        app.handle_action(Action::Submit);

        app.on_reply(Err(ChatError::RequestFailed("boom".into())));
        let last = app.controller().transcript().last().unwrap();
        assert!(last.is_error);
        assert_eq!(last.text, ERROR_REPLY);
        assert!(app.controller().is_input_enabled());
        assert_eq!(app.selected(), None);
    }

    #[test]
    fn test_cancel_only_when_turn_running() {
        let (mut app, _dir) = create_test_app();
        assert_eq!(app.handle_action(Action::Cancel), None);

        type_text(&mut app, "hello");
        app.handle_action(Action::Submit);
        assert_eq!(app.handle_action(Action::Cancel), Some(Effect::CancelTurn));

        app.on_cancelled();
        assert_eq!(app.controller().state(), TurnState::Idle);
        assert!(app.controller().transcript().last().unwrap().is_error);
    }

    #[test]
    fn test_quick_action_sends_preset() {
        let (mut app, _dir) = create_test_app();
        let preset = app.config().quick_actions[0].clone();

        let effect = app.handle_action(Action::QuickAction(0));
        assert_eq!(effect, Some(Effect::Send(preset.clone())));
        assert_eq!(app.controller().transcript()[0].text, preset);

        // Out of range and while busy: nothing happens.
        assert_eq!(app.handle_action(Action::QuickAction(1)), None);
        app.on_reply(Ok(reply("ok", "c1")));
        assert_eq!(app.handle_action(Action::QuickAction(8)), None);
    }

    #[test]
    fn test_input_respects_length_cap() {
        let config = ClientConfig {
            max_message_length: 3,
            ..ClientConfig::default()
        };
        let (mut app, _dir) = create_test_app_with(MockBackend::default(), config);
        type_text(&mut app, "abcdef");
        assert_eq!(app.input.content(), "abc");
    }

    #[test]
    fn test_feedback_flow_through_modal() {
        let (mut app, _dir) = create_test_app();
        type_text(&mut app, "hello");
        app.handle_action(Action::Submit);
        app.on_reply(Ok(reply("Hi!", "c1")));

        app.handle_action(Action::Feedback);
        assert!(app.modal.is_open());

        app.handle_action(Action::Toggle);
        type_text(&mut app, "chưa rõ");
        let effect = app.handle_action(Action::Submit);
        let Some(Effect::Feedback(record)) = effect else {
            panic!("expected feedback effect, got {effect:?}");
        };
        assert_eq!(record.conversation_id, "c1".into());
        assert!(!record.helpful);
        assert_eq!(record.comment, "chưa rõ");

        // Pending: further submits do nothing.
        assert_eq!(app.handle_action(Action::Submit), None);

        app.on_feedback(Ok(FeedbackAck::default()));
        assert!(!app.modal.is_open());
        assert_eq!(
            app.notification().map(|n| n.kind),
            Some(NotificationKind::Success)
        );
    }

    #[test]
    fn test_feedback_failure_notifies_error() {
        let (mut app, _dir) = create_test_app();
        app.on_history(vec![HistoryEntry {
            id: ConversationId::Numeric(7),
            message: "q".into(),
            response: "a".into(),
            intent: None,
            is_crisis: false,
            created_at: None,
        }]);
        assert!(app.open_feedback());
        let Some(Effect::Feedback(_)) = app.handle_action(Action::Submit) else {
            panic!("expected feedback effect");
        };

        app.on_feedback(Err(ChatError::RequestFailed("500".into())));
        assert_eq!(
            app.notification().map(|n| n.kind),
            Some(NotificationKind::Error)
        );
        assert!(app.modal.target().is_none());
    }

    #[test]
    fn test_feedback_unavailable_without_bot_reply() {
        let (mut app, _dir) = create_test_app();
        assert!(!app.open_feedback());

        type_text(&mut app, "hello");
        app.handle_action(Action::Submit);
        app.on_reply(Err(ChatError::RequestFailed("x".into())));
        app.handle_action(Action::Feedback);
        assert!(!app.modal.is_open());
    }

    #[test]
    fn test_escape_closes_modal_without_call() {
        let (mut app, _dir) = create_test_app();
        type_text(&mut app, "hello");
        app.handle_action(Action::Submit);
        app.on_reply(Ok(reply("Hi!", "c1")));
        app.handle_action(Action::Feedback);

        assert_eq!(app.handle_action(Action::Cancel), None);
        assert!(!app.modal.is_open());
        assert!(app.modal.target().is_none());
    }

    #[test]
    fn test_selection_moves_between_replies() {
        let (mut app, _dir) = create_test_app();
        let entry = |id: i64| HistoryEntry {
            id: id.into(),
            message: format!("q{id}"),
            response: format!("a{id}"),
            intent: None,
            is_crisis: false,
            created_at: None,
        };
        // Newest first, as the backend sends them.
        app.on_history(vec![entry(3), entry(2), entry(1)]);
        assert_eq!(app.selected(), Some(5));

        app.handle_action(Action::SelectPrev);
        assert_eq!(app.selected(), Some(3));
        app.handle_action(Action::SelectPrev);
        assert_eq!(app.selected(), Some(1));
        app.handle_action(Action::SelectPrev);
        assert_eq!(app.selected(), Some(1));

        app.handle_action(Action::SelectNext);
        assert_eq!(app.selected(), Some(3));
        app.handle_action(Action::SelectNext);
        app.handle_action(Action::SelectNext);
        assert_eq!(app.selected(), Some(5));

        app.handle_action(Action::Feedback);
        assert_eq!(app.modal.target(), Some(&ConversationId::Numeric(3)));
    }

    #[test]
    fn test_theme_toggle_persists() {
        let (mut app, dir) = create_test_app();
        assert_eq!(app.theme_mode(), ThemeMode::Light);

        app.handle_action(Action::ToggleTheme);
        assert_eq!(app.theme_mode(), ThemeMode::Dark);

        let store = LocalStore::open(dir.path()).unwrap();
        assert_eq!(ThemeMode::load(&store, "mindful-theme"), ThemeMode::Dark);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let (mut app, _dir) = create_test_app();
        app.handle_action(Action::Help);
        assert!(app.show_help);
        app.handle_action(Action::Char('a'));
        assert!(!app.show_help);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_notification_expires() {
        let (mut app, _dir) = create_test_app();
        app.on_feedback(Err(ChatError::FeedbackMissingTarget));
        let created = app.notification().unwrap().created_at;

        app.tick(created);
        assert!(app.notification().is_some());
        app.tick(created + NOTIFICATION_TTL);
        assert!(app.notification().is_none());
    }

    #[test]
    fn test_auto_scroll_follows_new_messages() {
        let (mut app, _dir) = create_test_app();
        app.transcript_state.scroll_up(2);
        assert!(!app.transcript_state.is_following());

        type_text(&mut app, "hello");
        app.handle_action(Action::Submit);
        assert!(app.transcript_state.is_following());
    }

    #[test]
    fn test_auto_scroll_disabled_keeps_position() {
        let config = ClientConfig {
            auto_scroll: false,
            ..ClientConfig::default()
        };
        let (mut app, _dir) = create_test_app_with(MockBackend::default(), config);
        render_app_to_string(&mut app, 80, 24);

        for i in 0..6 {
            type_text(&mut app, &format!("tin nhắn {i}"));
            app.handle_action(Action::Submit);
            app.on_reply(Ok(reply(&format!("trả lời {i}"), &format!("c{i}"))));
            render_app_to_string(&mut app, 80, 24);
        }

        assert!(app.transcript_state.viewport() > 0);
        assert_eq!(app.transcript_state.offset(), 0);
        assert!(!app.transcript_state.is_following());
    }

    #[test]
    fn test_selection_survives_history_prepend() {
        let (mut app, _dir) = create_test_app();
        for id in ["c1", "c2"] {
            type_text(&mut app, "hello");
            app.handle_action(Action::Submit);
            app.on_reply(Ok(reply("Hi!", id)));
        }
        app.handle_action(Action::SelectPrev);
        assert_eq!(app.selected(), Some(1));

        app.on_history(vec![HistoryEntry {
            id: ConversationId::Numeric(9),
            message: "old".into(),
            response: "older".into(),
            intent: None,
            is_crisis: false,
            created_at: None,
        }]);
        assert_eq!(app.selected(), Some(3));

        app.handle_action(Action::Feedback);
        assert_eq!(app.modal.target(), Some(&ConversationId::Text("c1".into())));
    }

    #[test]
    fn test_session_conversation_is_default_target() {
        let (mut app, _dir) = create_test_app();
        type_text(&mut app, "hello");
        app.handle_action(Action::Submit);
        app.on_reply(Ok(reply("Hi!", "c1")));

        type_text(&mut app, "again");
        app.handle_action(Action::Submit);
        app.on_reply(Err(ChatError::RequestFailed("boom".into())));

        let active = app.controller().session().conversation_id().cloned();
        assert_eq!(active, Some(ConversationId::Text("c1".into())));
        assert_eq!(app.selected(), Some(1));

        app.handle_action(Action::Feedback);
        assert_eq!(app.modal.target(), active.as_ref());
    }
}
