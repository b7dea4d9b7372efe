//! Status bar widget.
//!
//! Shows key hints, or the current notification while one is active.

use mindful_engine::{Notification, NotificationKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

/// A key hint for the status bar.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: &'static str,
    pub label: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// Status bar widget displayed at the bottom of the screen.
pub struct StatusBar<'a> {
    theme: &'a Theme,
    hints: &'a [KeyHint],
    notification: Option<&'a Notification>,
    right_text: Option<&'a str>,
}

impl<'a> StatusBar<'a> {
    pub fn new(theme: &'a Theme, hints: &'a [KeyHint]) -> Self {
        Self {
            theme,
            hints,
            notification: None,
            right_text: None,
        }
    }

    #[must_use]
    pub fn notification(mut self, notification: Option<&'a Notification>) -> Self {
        self.notification = notification;
        self
    }

    /// Set right-aligned text.
    #[must_use]
    pub fn right(mut self, text: &'a str) -> Self {
        self.right_text = Some(text);
        self
    }
}

impl Widget for StatusBar<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let bar = Style::default().bg(self.theme.surface).fg(self.theme.subtext);
        for x in area.x..area.x.saturating_add(area.width) {
            buf[(x, area.y)].set_char(' ').set_style(bar);
        }

        let left = if let Some(notification) = self.notification {
            let bg = match notification.kind {
                NotificationKind::Success => self.theme.success,
                NotificationKind::Error => self.theme.error,
            };
            Line::from(Span::styled(
                format!(" {} ", notification.text),
                Style::default()
                    .bg(bg)
                    .fg(self.theme.base)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            let mut spans = Vec::new();
            for hint in self.hints {
                spans.push(Span::styled(
                    format!(" {} ", hint.key),
                    Style::default()
                        .bg(self.theme.overlay)
                        .fg(self.theme.text)
                        .add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::styled(format!(" {} ", hint.label), bar));
            }
            Line::from(spans)
        };
        buf.set_line(area.x, area.y, &left, area.width);

        if let Some(text) = self.right_text {
            let text_len = text.width() as u16;
            if text_len < area.width {
                let x = area.x + area.width - text_len - 1;
                buf.set_string(x, area.y, text, bar);
            }
        }
    }
}
