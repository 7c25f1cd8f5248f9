//! TUI rendering: orchestrates all panes.

pub mod chat;
pub mod form;
pub mod hexagram;
pub mod history;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use yijing_core::{backend::DivinationBackend, storage::Storage};

use crate::{
  app::{App, Overlay, Screen},
  notice::NoticeLevel,
};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<B, S>(f: &mut Frame, app: &App<B, S>)
where
  B: DivinationBackend + Clone + 'static,
  S: Storage + Clone,
{
  let area = f.area();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Workbench => draw_workbench(f, rows[1], app),
    Screen::History => history::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);

  if let Some(overlay) = &app.overlay {
    draw_overlay(f, area, app, overlay);
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<B, S>(f: &mut Frame, area: Rect, app: &App<B, S>)
where
  B: DivinationBackend + Clone + 'static,
  S: Storage + Clone,
{
  let s = app.strings();
  let (health, health_color) = match app.healthy {
    Some(true) => (s.online, Color::Green),
    Some(false) => (s.offline, Color::Red),
    None => ("…", Color::Gray),
  };
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    format!(" ☯ {} ", s.app_title),
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  );
  let right = format!(
    "{}  {}  {date} ",
    app.language().native_name(),
    if app.workbench.include_najia { s.najia_toggle } else { "" },
  );

  let used = left.width() + right.chars().count() + health.chars().count() + 3;
  let pad = (area.width as usize).saturating_sub(used);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad)),
    Span::styled(format!("● {health} "), Style::default().fg(health_color)),
    Span::styled(right, Style::default().fg(Color::Gray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_workbench<B, S>(f: &mut Frame, area: Rect, app: &App<B, S>)
where
  B: DivinationBackend + Clone + 'static,
  S: Storage + Clone,
{
  // Left: inputs. Right: result over chat.
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
    .split(area);
  let right = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
    .split(cols[1]);

  let s = app.strings();
  form::draw(f, cols[0], &app.workbench, s);
  hexagram::draw(f, right[0], &app.workbench, s);
  chat::draw(f, right[1], &app.workbench, s);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<B, S>(f: &mut Frame, area: Rect, app: &App<B, S>)
where
  B: DivinationBackend + Clone + 'static,
  S: Storage + Clone,
{
  let s = app.strings();
  let (mode, hints) = match (&app.overlay, app.screen) {
    (Some(_), _) => ("OVERLAY", s.keys_overlay),
    (None, Screen::History) => ("HISTORY", s.keys_history),
    (None, Screen::Workbench) if app.workbench.is_loading() => ("BUSY", s.keys_workbench),
    (None, Screen::Workbench) => ("NORMAL", s.keys_workbench),
  };

  let (text, color) = match app.workbench.notices.latest() {
    Some(n) => {
      let color = match n.level {
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Error => Color::Red,
      };
      (n.text(), color)
    }
    None => (hints.to_string(), Color::DarkGray),
  };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode} "),
      Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {text}"), Style::default().fg(color)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

// ─── Overlay ──────────────────────────────────────────────────────────────────

fn draw_overlay<B, S>(f: &mut Frame, area: Rect, app: &App<B, S>, overlay: &Overlay)
where
  B: DivinationBackend + Clone + 'static,
  S: Storage + Clone,
{
  let s = app.strings();
  let (title, body) = match overlay {
    Overlay::Help(text) => (s.help_title, text.as_str()),
    Overlay::ManualCopy(text) => (s.copy_manual, text.as_str()),
  };
  let popup = centered(area, 80, 80);
  f.render_widget(Clear, popup);
  f.render_widget(
    Paragraph::new(body).wrap(Wrap { trim: false }).block(
      Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow)),
    ),
    popup,
  );
}

/// A rectangle `pct_x`% by `pct_y`% of `area`, centred.
fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Percentage((100 - pct_y) / 2),
      Constraint::Percentage(pct_y),
      Constraint::Percentage((100 - pct_y) / 2),
    ])
    .split(area);
  Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage((100 - pct_x) / 2),
      Constraint::Percentage(pct_x),
      Constraint::Percentage((100 - pct_x) / 2),
    ])
    .split(rows[1])[1]
}

/// Border style for a pane, highlighted when focused.
fn pane_block(title: &str, focused: bool) -> Block<'static> {
  let color = if focused { Color::Yellow } else { Color::DarkGray };
  Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(color))
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use ratatui::{Terminal, backend::TestBackend};
  use rand::{SeedableRng, rngs::StdRng};
  use yijing_core::{language::Language, storage::MemoryStorage};

  use super::*;
  use crate::{clipboard::Unavailable, config::Latency, testing::FakeBackend, workbench::Workbench};

  fn render<B, S>(app: &App<B, S>) -> String
  where
    B: DivinationBackend + Clone + 'static,
    S: Storage + Clone,
  {
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    terminal.draw(|f| draw(f, app)).unwrap();
    let buffer = terminal.backend().buffer().clone();
    buffer.content().iter().map(|c| c.symbol()).collect()
  }

  fn app() -> App<FakeBackend, Arc<MemoryStorage>> {
    App::new(
      FakeBackend::default(),
      Arc::new(MemoryStorage::new()),
      Workbench::with_rng(Latency::NONE, false, StdRng::seed_from_u64(0)),
      Language::En,
      std::env::temp_dir(),
      Box::new(Unavailable),
    )
  }

  #[tokio::test]
  async fn renders_empty_workbench_and_result() {
    let mut app = app();
    let screen = render(&app);
    assert!(screen.contains("Question"));
    assert!(screen.contains("Method"));

    app.workbench.question = "rain".into();
    app.submit();
    app.next_task().await;
    let screen = render(&app);
    assert!(screen.contains("Interpretation"));
    assert!(screen.contains("interpretation (en)"));
  }

  #[tokio::test]
  async fn renders_history_and_overlay() {
    let mut app = app();
    app.open_history();
    assert!(render(&app).contains("No saved divinations"));

    app.overlay = Some(Overlay::Help("usage text".into()));
    assert!(render(&app).contains("usage text"));
  }
}
