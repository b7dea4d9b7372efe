//! Draws the chat screen from the app state.

use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{StatefulWidget, Widget},
};

use crate::app::App;
use crate::layout::chat_layout;
use crate::widgets::{
    input_height, FeedbackOverlay, HelpOverlay, InputBar, KeyHint, StatusBar, Transcript,
};

const HINTS: [KeyHint; 4] = [
    KeyHint::new("Enter", "gửi"),
    KeyHint::new("Ctrl+F", "đánh giá"),
    KeyHint::new("Ctrl+T", "giao diện"),
    KeyHint::new("F1", "trợ giúp"),
];

const BUSY_HINTS: [KeyHint; 2] = [KeyHint::new("Esc", "huỷ"), KeyHint::new("F1", "trợ giúp")];

/// Render the whole screen.
pub fn render(app: &mut App, area: Rect, buf: &mut Buffer) {
    render_at(app, area, buf, Instant::now());
}

pub(crate) fn render_at(app: &mut App, area: Rect, buf: &mut Buffer, now: Instant) {
    let areas = chat_layout(area, input_height(&app.input));

    let welcome = app.welcome_lines();
    let selected = app.selected();
    let typing = app.typing_frame(now);
    Transcript::new(app.controller.transcript(), &app.theme)
        .selected(selected)
        .typing(typing)
        .welcome(welcome)
        .render(areas.transcript, buf, &mut app.transcript_state);

    InputBar::new(&app.input, &app.theme, app.config().max_message_length)
        .enabled(app.controller().is_input_enabled() && !app.modal.is_open())
        .render(areas.input, buf);

    let hints: &[KeyHint] = if app.controller().is_input_enabled() {
        &HINTS
    } else {
        &BUSY_HINTS
    };
    StatusBar::new(&app.theme, hints)
        .notification(app.notification())
        .right(app.theme_mode().as_str())
        .render(areas.status, buf);

    FeedbackOverlay::new(&app.modal, &app.comment, app.helpful, &app.theme).render(area, buf);

    if app.show_help {
        HelpOverlay::new(&app.theme).render(area, buf);
    }
}
