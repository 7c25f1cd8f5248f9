//! History screen: saved divinations, newest first.

use chrono::Local;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph},
};
use yijing_core::{backend::DivinationBackend, storage::Storage};

use super::pane_block;
use crate::app::App;

pub fn draw<B, S>(f: &mut Frame, area: Rect, app: &App<B, S>)
where
  B: DivinationBackend + Clone + 'static,
  S: Storage + Clone,
{
  let s = app.strings();
  let block = pane_block(&format!("{} ({})", s.history_title, app.records.len()), true);
  let inner = block.inner(area);
  f.render_widget(block, area);

  if app.records.is_empty() {
    f.render_widget(
      Paragraph::new(s.history_empty).style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = app
    .records
    .iter()
    .map(|r| {
      let when = r.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
      let changed = r
        .changed_hexagram
        .as_ref()
        .map(|c| format!(" → {}", c.name))
        .unwrap_or_default();
      let who = r.diviner_name.as_deref().unwrap_or(s.anonymous);
      ListItem::new(Line::from(vec![
        Span::styled(format!("{when}  "), Style::default().fg(Color::DarkGray)),
        Span::styled(
          format!("{} {}{changed}", r.original_hexagram.symbol, r.original_hexagram.name),
          Style::default().fg(Color::Yellow),
        ),
        Span::raw(format!("  {}", r.question)),
        Span::styled(format!("  ({who})"), Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.history_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}
