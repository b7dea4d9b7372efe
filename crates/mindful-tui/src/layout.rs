//! Layout helpers for the chat screen.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas of the chat screen, top to bottom.
#[derive(Debug, Clone, Copy)]
pub struct ChatAreas {
    pub transcript: Rect,
    pub input: Rect,
    pub status: Rect,
}

/// Split the screen into transcript, input bar and status bar.
pub fn chat_layout(area: Rect, input_height: u16) -> ChatAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(area);
    ChatAreas {
        transcript: chunks[0],
        input: chunks[1],
        status: chunks[2],
    }
}

/// Create a centered rect with fixed dimensions.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
