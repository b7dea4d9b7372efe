//! mindful-tui: terminal chat client for the Mindful Chatbox backend
//!
//! This crate provides the interactive layer:
//! - Transcript, input bar and status bar widgets
//! - Feedback and help overlays
//! - The event loop that runs network calls off the UI thread

mod app;
mod event;
mod layout;
#[cfg(test)]
pub mod test_utils;
mod theme;
mod view;
mod widgets;

pub use app::{App, Effect};
pub use event::{Action, Event, EventHandler};
pub use mindful_engine;

use std::io::{self, stdout};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mindful_engine::{
    request_reply, ChatBackend, ChatError, ChatReply, ClientConfig, FeedbackAck, HistoryEntry,
    HttpChatClient, LocalStore, TurnOutcome,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// UI refresh rate (4 Hz).
const TICK_RATE_MS: u64 = 250;

/// Lines scrolled per mouse wheel notch.
const WHEEL_LINES: usize = 3;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// In-flight network work. At most one of each kind.
#[derive(Default)]
struct Tasks {
    send: Option<JoinHandle<Result<ChatReply, ChatError>>>,
    history: Option<JoinHandle<Vec<HistoryEntry>>>,
    feedback: Option<JoinHandle<Result<FeedbackAck, ChatError>>>,
}

impl Tasks {
    fn abort_all(&mut self) {
        if let Some(handle) = self.send.take() {
            handle.abort();
        }
        if let Some(handle) = self.history.take() {
            handle.abort();
        }
        if let Some(handle) = self.feedback.take() {
            handle.abort();
        }
    }
}

/// Take a handle out of its slot once the task has finished.
fn take_finished<T>(slot: &mut Option<JoinHandle<T>>) -> Option<JoinHandle<T>> {
    if slot.as_ref().is_some_and(JoinHandle::is_finished) {
        slot.take()
    } else {
        None
    }
}

/// Run the interactive client.
///
/// Sets up the terminal, restores the saved session, loads history and runs
/// the event loop until the user quits. The session cookie is saved on exit.
pub async fn run_tui(
    config: ClientConfig,
    state_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = LocalStore::open(state_dir)?;
    let client = Arc::new(HttpChatClient::new(&config)?);
    client.load_session(&store, &config.session_key);
    info!(api = client.base_url(), "Starting chat client");

    let chat_backend: Arc<dyn ChatBackend> = client.clone();
    let mut app = App::new(chat_backend, config, store);

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut events = EventHandler::new(TICK_RATE_MS);

    let result = run_loop(&mut terminal, &mut app, &mut events, &client).await;

    terminal.show_cursor()?;

    let session_key = app.config().session_key.clone();
    if let Err(e) = client.save_session(app.store_mut(), &session_key) {
        warn!(error = %e, "Failed to save session");
    }

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    client: &HttpChatClient,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut tasks = Tasks::default();

    let backend = app.controller().backend();
    let limit = app.controller().history_limit();
    tasks.history = Some(tokio::spawn(async move { backend.get_history(limit).await }));

    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            view::render(app, area, frame.buffer_mut());
        })?;

        if let Some(handle) = take_finished(&mut tasks.history) {
            match handle.await {
                Ok(entries) => app.on_history(entries),
                Err(e) => warn!(error = %e, "History task failed"),
            }
        }

        if let Some(handle) = take_finished(&mut tasks.send) {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(ChatError::RequestFailed(e.to_string())));
            if let TurnOutcome::Replied(_) = app.on_reply(result) {
                let session_key = app.config().session_key.clone();
                if let Err(e) = client.save_session(app.store_mut(), &session_key) {
                    warn!(error = %e, "Failed to save session");
                }
            }
        }

        if let Some(handle) = take_finished(&mut tasks.feedback) {
            let result = handle
                .await
                .unwrap_or_else(|e| Err(ChatError::RequestFailed(e.to_string())));
            app.on_feedback(result);
        }

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => {
                    let action = event::key_to_action(key);
                    if let Some(effect) = app.handle_action(action) {
                        apply_effect(app, effect, &mut tasks);
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.transcript_state.scroll_up(WHEEL_LINES),
                    MouseEventKind::ScrollDown => app.transcript_state.scroll_down(WHEEL_LINES),
                    _ => {}
                },
                Event::Tick => app.tick(Instant::now()),
                Event::Resize(_, _) => {
                    // Redrawn on the next iteration
                }
            }
        }

        if app.should_quit {
            tasks.abort_all();
            break;
        }
    }

    Ok(())
}

/// Start the network work an action asked for.
fn apply_effect(app: &mut App, effect: Effect, tasks: &mut Tasks) {
    match effect {
        Effect::Send(text) => {
            let backend = app.controller().backend();
            let timeout = app.controller().request_timeout();
            tasks.send = Some(tokio::spawn(async move {
                request_reply(&*backend, &text, timeout).await
            }));
        }
        Effect::CancelTurn => {
            if tasks.send.as_ref().is_some_and(JoinHandle::is_finished) {
                // The reply is already in; the next poll delivers it.
                debug!("Cancel ignored, reply already arrived");
                return;
            }
            if let Some(handle) = tasks.send.take() {
                handle.abort();
            }
            info!("Request cancelled by user");
            app.on_cancelled();
        }
        Effect::Feedback(record) => {
            let backend = app.controller().backend();
            tasks.feedback = Some(tokio::spawn(async move {
                backend.send_feedback(&record).await
            }));
        }
    }
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
