//! Key binding overlay.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::layout::centered_fixed;
use crate::theme::Theme;

const HELP_TEXT: &str = "
  Enter            Gửi tin nhắn
  Ctrl+J           Xuống dòng
  Alt+1..9         Gửi câu hỏi nhanh
  Esc              Huỷ yêu cầu đang chờ
  Ctrl+F           Đánh giá câu trả lời đã chọn
  Alt+Up/Down      Chọn câu trả lời
  PgUp/PgDn        Cuộn hội thoại
  Up/Down          Tin nhắn đã gửi
  Ctrl+T           Đổi giao diện sáng/tối
  F1               Bật/tắt trợ giúp
  Ctrl+C           Thoát

  [Nhấn phím bất kỳ để đóng]
";

/// Help overlay listing the key bindings.
pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl Widget for HelpOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = 56_u16.min(area.width.saturating_sub(4));
        let height = 17_u16.min(area.height.saturating_sub(2));
        let overlay = centered_fixed(width, height, area);

        Clear.render(overlay, buf);

        let block = Block::default()
            .title(" Trợ giúp ")
            .title_style(
                Style::default()
                    .fg(self.theme.text)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused))
            .style(Style::default().bg(self.theme.surface).fg(self.theme.text));

        Paragraph::new(HELP_TEXT).block(block).render(overlay, buf);
    }
}
