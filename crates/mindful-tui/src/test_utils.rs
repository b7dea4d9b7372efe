//! Test utilities for mindful-tui rendering and app tests.

use std::sync::Arc;
use std::time::Instant;

use mindful_engine::testing::MockBackend;
use mindful_engine::{ChatReply, ClientConfig, LocalStore};
use ratatui::{buffer::Buffer, layout::Rect};
use tempfile::TempDir;

use crate::app::App;

/// An app over a mock backend with a preference store in a temp dir.
/// Keep the `TempDir` alive for as long as the app.
pub fn create_test_app() -> (App, TempDir) {
    create_test_app_with(MockBackend::default(), ClientConfig::default())
}

/// Same as [`create_test_app`] with a custom backend and config.
pub fn create_test_app_with(backend: MockBackend, config: ClientConfig) -> (App, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = LocalStore::open(dir.path()).expect("Failed to open store");
    (App::new(Arc::new(backend), config, store), dir)
}

/// A backend reply with a text conversation id.
pub fn reply(text: &str, id: &str) -> ChatReply {
    ChatReply {
        response: text.to_string(),
        conversation_id: id.into(),
        intent: None,
        is_crisis: false,
    }
}

/// Convert a buffer to a string, one line per row, trailing spaces trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            let cell = buffer.cell((x, y)).unwrap();
            result.push_str(cell.symbol());
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

/// Render the full screen and return it as a string.
pub fn render_app_to_string(app: &mut App, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    crate::view::render_at(app, area, &mut buffer, Instant::now());
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_app() {
        let (app, _dir) = create_test_app();
        assert!(app.controller().transcript().is_empty());
        assert!(app.controller().is_input_enabled());
    }

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", ratatui::style::Style::default());
        buffer.set_string(0, 1, "World", ratatui::style::Style::default());

        let result = buffer_to_string(&buffer);
        assert_eq!(result, "Hello\nWorld\n");
    }
}
