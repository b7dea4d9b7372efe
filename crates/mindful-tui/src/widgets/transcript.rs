//! Scrollable transcript pane.
//!
//! Messages are pre-wrapped to the pane width so the scroll offset is in
//! rendered lines. User messages are right-aligned, bot messages left.
//!
//! ```text
//! ┌─ Mindful ──────────────────────────────┐
//! │                            Bạn · 08:30 │
//! │                   Dạo này mình khó ngủ │
//! │                                        │
//! │▸ Mindful · 08:30 · sleep               │
//! │  Mất ngủ có thể do căng thẳng...       │
//! │  Ctrl+F đánh giá                       │
//! └────────────────────────────────────────┘
//! ```

use chrono::Local;
use mindful_engine::{Message, Sender};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};

use crate::theme::{symbols, Theme};

/// Indentation of message bodies.
const BODY_INDENT: &str = "  ";

/// Scroll position of the transcript.
///
/// `follow` pins the view to the newest line; scrolling up releases it and
/// scrolling back to the end re-engages it. With `auto_follow` off the view
/// never pins itself and stays where the user left it.
#[derive(Debug, Clone)]
pub struct TranscriptState {
    offset: usize,
    follow: bool,
    auto_follow: bool,
    total: usize,
    viewport: usize,
}

impl TranscriptState {
    pub fn new(auto_follow: bool) -> Self {
        Self {
            offset: 0,
            follow: auto_follow,
            auto_follow,
            total: 0,
            viewport: 0,
        }
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// First visible line, as of the last render.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Visible height, as of the last render.
    pub fn viewport(&self) -> usize {
        self.viewport
    }

    fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.viewport)
    }

    pub fn scroll_up(&mut self, amount: usize) {
        if self.follow {
            self.offset = self.max_offset();
        }
        self.follow = false;
        self.offset = self.offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.offset = (self.offset + amount).min(self.max_offset());
        if self.auto_follow && self.offset == self.max_offset() {
            self.follow = true;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = self.auto_follow;
        self.offset = self.max_offset();
    }

    fn update(&mut self, total: usize, viewport: usize) {
        self.total = total;
        self.viewport = viewport;
        self.offset = if self.follow {
            self.max_offset()
        } else {
            self.offset.min(self.max_offset())
        };
    }
}

/// Transcript widget.
pub struct Transcript<'a> {
    messages: &'a [Message],
    theme: &'a Theme,
    selected: Option<usize>,
    typing: Option<&'a str>,
    welcome: Vec<Line<'static>>,
}

impl<'a> Transcript<'a> {
    pub fn new(messages: &'a [Message], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            selected: None,
            typing: None,
            welcome: Vec::new(),
        }
    }

    /// Index of the message feedback would target.
    #[must_use]
    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    /// Show the typing indicator with the given spinner frame.
    #[must_use]
    pub fn typing(mut self, frame: Option<&'a str>) -> Self {
        self.typing = frame;
        self
    }

    /// Lines shown while the transcript is empty.
    #[must_use]
    pub fn welcome(mut self, lines: Vec<Line<'static>>) -> Self {
        self.welcome = lines;
        self
    }

    fn header(&self, message: &Message, selected: bool) -> Line<'static> {
        let time = message
            .timestamp
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();
        let muted = Style::default().fg(self.theme.muted);

        match message.sender {
            Sender::User => Line::from(vec![
                Span::styled(
                    "Bạn",
                    Style::default()
                        .fg(self.theme.user)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" · {time}"), muted),
            ])
            .alignment(Alignment::Right),
            Sender::Bot => {
                let mut spans = Vec::new();
                if selected {
                    spans.push(Span::styled(
                        symbols::SELECTED,
                        Style::default().fg(self.theme.primary),
                    ));
                }
                if message.is_crisis {
                    spans.push(Span::styled(
                        symbols::CRISIS,
                        Style::default()
                            .fg(self.theme.error)
                            .add_modifier(Modifier::BOLD),
                    ));
                }
                spans.push(Span::styled(
                    "Mindful",
                    Style::default()
                        .fg(self.theme.bot)
                        .add_modifier(Modifier::BOLD),
                ));
                spans.push(Span::styled(format!(" · {time}"), muted));
                if let Some(intent) = &message.intent {
                    spans.push(Span::styled(format!(" · {intent}"), muted));
                }
                Line::from(spans)
            }
        }
    }

    fn body_style(&self, message: &Message) -> Style {
        if message.is_error || message.is_crisis {
            Style::default().fg(self.theme.error)
        } else {
            Style::default().fg(self.theme.text)
        }
    }

    /// Build the wrapped lines for every message.
    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        if self.messages.is_empty() && self.typing.is_none() {
            return self.welcome.clone();
        }

        let wrap_width = width.saturating_sub(BODY_INDENT.len()).max(1);
        let mut lines = Vec::new();

        for (index, message) in self.messages.iter().enumerate() {
            let selected = self.selected == Some(index);
            lines.push(self.header(message, selected));

            let style = self.body_style(message);
            for piece in textwrap::wrap(&message.text, wrap_width) {
                let line = match message.sender {
                    Sender::User => {
                        Line::from(Span::styled(piece.into_owned(), style))
                            .alignment(Alignment::Right)
                    }
                    Sender::Bot => Line::from(vec![
                        Span::raw(BODY_INDENT),
                        Span::styled(piece.into_owned(), style),
                    ]),
                };
                lines.push(line);
            }

            if selected && message.accepts_feedback() {
                lines.push(Line::from(vec![
                    Span::raw(BODY_INDENT),
                    Span::styled(
                        "Ctrl+F đánh giá",
                        Style::default()
                            .fg(self.theme.primary)
                            .add_modifier(Modifier::ITALIC),
                    ),
                ]));
            }
            lines.push(Line::default());
        }

        if let Some(frame) = self.typing {
            lines.push(Line::from(vec![
                Span::styled(format!("{frame} "), Style::default().fg(self.theme.bot)),
                Span::styled(
                    "Mindful đang trả lời...",
                    Style::default().fg(self.theme.muted),
                ),
            ]));
        }

        lines
    }
}

/// Paragraph scroll is `u16`; longer transcripts pin to the last reachable line.
fn scroll_offset(offset: usize) -> u16 {
    u16::try_from(offset).unwrap_or(u16::MAX)
}

impl StatefulWidget for Transcript<'_> {
    type State = TranscriptState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .title(" Mindful ")
            .title_style(Style::default().fg(self.theme.text))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .style(Style::default().bg(self.theme.base));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let lines = self.lines(inner.width as usize);
        state.update(lines.len(), inner.height as usize);

        Paragraph::new(lines)
            .scroll((scroll_offset(state.offset), 0))
            .render(inner, buf);
    }
}
