//! Chat pane under the result.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Wrap},
};
use yijing_core::chat::ChatRole;

use super::pane_block;
use crate::{
  i18n::Strings,
  workbench::{Focus, Workbench},
};

pub fn draw(f: &mut Frame, area: Rect, wb: &Workbench, s: &Strings) {
  let focused = wb.focus == Focus::Chat;
  let block = pane_block(s.chat_title, focused);
  let inner = block.inner(area);
  f.render_widget(block, area);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Min(0), Constraint::Length(1)])
    .split(inner);

  let mut lines: Vec<Line> = Vec::new();
  for m in wb.chat.messages() {
    let (who, color) = match m.role {
      ChatRole::User => (s.you, Color::Cyan),
      ChatRole::Assistant => (s.assistant, Color::Green),
    };
    lines.push(Line::from(vec![
      Span::styled(format!("{who}: "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
      Span::raw(m.content.clone()),
    ]));
  }
  if wb.chat.is_waiting() {
    lines.push(Line::from(Span::styled(s.thinking, Style::default().fg(Color::DarkGray))));
  }

  // Keep the newest turns visible.
  let height = rows[0].height as usize;
  let skip = lines.len().saturating_sub(height);
  let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
  f.render_widget(Paragraph::new(visible).wrap(Wrap { trim: false }), rows[0]);

  let prompt = if wb.result().is_none() {
    Span::styled(s.chat_needs_result, Style::default().fg(Color::DarkGray))
  } else if wb.chat.input.is_empty() && !focused {
    Span::styled(s.chat_empty, Style::default().fg(Color::DarkGray))
  } else {
    Span::raw(format!("> {}{}", wb.chat.input, if focused { "▏" } else { "" }))
  };
  f.render_widget(Paragraph::new(Line::from(prompt)), rows[1]);
}
