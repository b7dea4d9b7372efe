//! Full-width input bar widget.
//!
//! Grows with the number of lines typed (up to [`MAX_INPUT_LINES`]) and shows
//! a `len/max` counter on its bottom border. While a turn is in flight the
//! bar is disabled and rendered dimmed.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::TextInputState;
use crate::theme::{symbols, Theme};

/// Lines of text shown before the bar starts scrolling.
pub const MAX_INPUT_LINES: usize = 5;

/// Height of the bar for the current content, borders included.
#[allow(clippy::cast_possible_truncation)]
pub fn input_height(input: &TextInputState) -> u16 {
    input.line_count().clamp(1, MAX_INPUT_LINES) as u16 + 2
}

/// Whether the counter should switch to the warning color.
pub fn near_limit(len: usize, max: usize) -> bool {
    len * 10 > max * 9
}

/// Input bar for composing messages.
pub struct InputBar<'a> {
    input: &'a TextInputState,
    theme: &'a Theme,
    enabled: bool,
    max_len: usize,
    placeholder: &'a str,
}

impl<'a> InputBar<'a> {
    pub fn new(input: &'a TextInputState, theme: &'a Theme, max_len: usize) -> Self {
        Self {
            input,
            theme,
            enabled: true,
            max_len,
            placeholder: "Nhập tin nhắn của bạn...",
        }
    }

    /// Disabled bars ignore focus and draw no cursor.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Build display lines and the index of the line holding the cursor.
    fn build_input_lines(&self) -> (Vec<Line<'static>>, usize) {
        let content = self.input.content();
        let cursor_pos = self.input.cursor();

        if content.is_empty() {
            let mut spans = vec![Span::raw("> ")];
            if self.enabled {
                spans.push(Span::raw(symbols::CURSOR));
            }
            spans.push(Span::styled(
                self.placeholder.to_string(),
                Style::default().fg(self.theme.muted),
            ));
            return (vec![Line::from(spans)], 0);
        }

        let text_lines: Vec<&str> = content.split('\n').collect();

        let mut char_count = 0;
        let mut cursor_line = 0;
        let mut cursor_col = 0;
        for (line_idx, line) in text_lines.iter().enumerate() {
            let line_len = line.chars().count();
            if cursor_pos <= char_count + line_len {
                cursor_line = line_idx;
                cursor_col = cursor_pos - char_count;
                break;
            }
            // +1 for the newline
            char_count += line_len + 1;
        }

        let mut lines = Vec::with_capacity(text_lines.len());
        for (line_idx, line_text) in text_lines.iter().enumerate() {
            let prefix = if line_idx == 0 { "> " } else { "  " };

            if self.enabled && line_idx == cursor_line {
                let chars: Vec<char> = line_text.chars().collect();
                let before: String = chars[..cursor_col].iter().collect();
                let after: String = chars[cursor_col..].iter().collect();
                lines.push(Line::from(vec![
                    Span::raw(prefix),
                    Span::raw(before),
                    Span::raw(symbols::CURSOR),
                    Span::raw(after),
                ]));
            } else {
                lines.push(Line::from(format!("{prefix}{line_text}")));
            }
        }

        (lines, cursor_line)
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.enabled {
            Style::default().fg(self.theme.border_focused)
        } else {
            Style::default().fg(self.theme.border)
        };

        let len = self.input.char_count();
        let counter_color = if near_limit(len, self.max_len) {
            self.theme.error
        } else {
            self.theme.subtext
        };
        let counter = Line::from(Span::styled(
            format!(" {len}/{} ", self.max_len),
            Style::default().fg(counter_color),
        ))
        .right_aligned();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title_bottom(counter);

        let inner_height = area.height.saturating_sub(2) as usize;
        let (lines, cursor_line) = self.build_input_lines();
        let scroll_offset = if lines.len() <= inner_height {
            0
        } else {
            cursor_line.saturating_sub(inner_height.saturating_sub(1))
        };

        let text_color = if self.enabled {
            self.theme.text
        } else {
            self.theme.muted
        };

        Paragraph::new(lines)
            .block(block)
            .style(Style::default().fg(text_color))
            .scroll((scroll_offset as u16, 0))
            .render(area, buf);
    }
}
