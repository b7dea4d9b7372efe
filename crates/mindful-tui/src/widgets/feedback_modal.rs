//! Feedback overlay.
//!
//! ```text
//! ┌─ Đánh giá câu trả lời ─────────────────┐
//! │ Câu trả lời này có hữu ích không?      │
//! │                                        │
//! │   [ Có ]   [ Không ]                   │
//! │                                        │
//! │ Góp ý (không bắt buộc):                │
//! │ > rất hữu ích█                         │
//! │                                        │
//! │ Tab chọn · Enter gửi · Esc đóng        │
//! └────────────────────────────────────────┘
//! ```

use mindful_engine::FeedbackModal;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use super::TextInputState;
use crate::layout::centered_fixed;
use crate::theme::{symbols, Theme};

const MODAL_WIDTH: u16 = 52;
const MODAL_HEIGHT: u16 = 11;

/// Feedback overlay widget. Renders nothing when the modal is closed.
pub struct FeedbackOverlay<'a> {
    modal: &'a FeedbackModal,
    comment: &'a TextInputState,
    helpful: bool,
    theme: &'a Theme,
}

impl<'a> FeedbackOverlay<'a> {
    pub fn new(
        modal: &'a FeedbackModal,
        comment: &'a TextInputState,
        helpful: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            modal,
            comment,
            helpful,
            theme,
        }
    }

    fn button(&self, label: &str, active: bool) -> Span<'static> {
        let style = if active {
            Style::default()
                .bg(self.theme.primary)
                .fg(self.theme.base)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(self.theme.overlay).fg(self.theme.text)
        };
        Span::styled(format!("[ {label} ]"), style)
    }
}

impl Widget for FeedbackOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.modal.is_open() {
            return;
        }

        let width = MODAL_WIDTH.min(area.width.saturating_sub(2));
        let height = MODAL_HEIGHT.min(area.height.saturating_sub(2));
        let overlay = centered_fixed(width, height, area);
        Clear.render(overlay, buf);

        let muted = Style::default().fg(self.theme.muted);
        let mut lines = vec![
            Line::from("Câu trả lời này có hữu ích không?"),
            Line::default(),
        ];

        if self.modal.is_pending() {
            lines.push(Line::from(Span::styled("Đang gửi đánh giá...", muted)));
        } else {
            lines.push(Line::from(vec![
                Span::raw("  "),
                self.button("Có", self.helpful),
                Span::raw("   "),
                self.button("Không", !self.helpful),
            ]));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("Góp ý (không bắt buộc):", muted)));
            lines.push(Line::from(vec![
                Span::raw("> "),
                Span::raw(self.comment.content().to_string()),
                Span::raw(symbols::CURSOR),
            ]));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Tab chọn · Enter gửi · Esc đóng",
                muted,
            )));
        }

        let block = Block::default()
            .title(" Đánh giá câu trả lời ")
            .title_style(
                Style::default()
                    .fg(self.theme.text)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused))
            .style(Style::default().bg(self.theme.surface).fg(self.theme.text));

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(overlay, buf);
    }
}
