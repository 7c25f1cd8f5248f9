//! Left pane: question, diviner, notes and the input method.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Wrap},
};
use strum::IntoEnumIterator;
use yijing_core::method::{DivinationMethod, InputPayload, THROW_COUNT};

use super::pane_block;
use crate::{
  i18n::Strings,
  workbench::{Focus, Workbench},
};

pub fn draw(f: &mut Frame, area: Rect, wb: &Workbench, s: &Strings) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(4), // question
      Constraint::Length(3), // diviner
      Constraint::Min(4),    // notes
      Constraint::Length(7), // method
    ])
    .split(area);

  let placeholder = if wb.is_loading() { s.divining } else { s.question_placeholder };
  draw_field(f, rows[0], s.question, &wb.question, placeholder, wb.focus == Focus::Question);
  draw_field(f, rows[1], s.diviner, &wb.diviner_name, s.anonymous, wb.focus == Focus::Diviner);
  draw_field(f, rows[2], s.notes, &wb.notes, "", wb.focus == Focus::Notes);
  draw_method(f, rows[3], wb, s);
}

fn draw_field(
  f: &mut Frame,
  area: Rect,
  title: &str,
  value: &str,
  placeholder: &str,
  focused: bool,
) {
  let text = if value.is_empty() {
    Line::from(Span::styled(placeholder.to_owned(), Style::default().fg(Color::DarkGray)))
  } else if focused {
    Line::from(format!("{value}▏"))
  } else {
    Line::from(value.to_owned())
  };
  f.render_widget(
    Paragraph::new(text)
      .wrap(Wrap { trim: false })
      .block(pane_block(title, focused)),
    area,
  );
}

fn draw_method(f: &mut Frame, area: Rect, wb: &Workbench, s: &Strings) {
  let current = wb.selector.method();
  let mut tabs: Vec<Span> = Vec::new();
  for method in DivinationMethod::iter() {
    let style = if method == current {
      Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    tabs.push(Span::styled(format!(" {} ", s.method_name(method)), style));
    tabs.push(Span::raw(" "));
  }

  let mut lines = vec![Line::from(tabs), Line::from("")];

  match current {
    DivinationMethod::Coins => {
      let coins = wb.selector.coin_display();
      let marks: String = (0..THROW_COUNT)
        .map(|i| match coins.get(i) {
          Some(sum) => format!("{sum} "),
          None => "· ".into(),
        })
        .collect();
      let label = if wb.selector.is_throwing() { s.throwing } else { s.coins };
      lines.push(Line::from(format!("{label}: {marks}")));
    }
    DivinationMethod::Numbers => {
      let focused = wb.focus == Focus::Digits;
      let shown = if wb.selector.digits.is_empty() {
        Span::styled(s.digits_hint, Style::default().fg(Color::DarkGray))
      } else if focused {
        Span::raw(format!("{}▏", wb.selector.digits))
      } else {
        Span::raw(wb.selector.digits.clone())
      };
      let label_style = if focused {
        Style::default().fg(Color::Yellow)
      } else {
        Style::default()
      };
      lines.push(Line::from(vec![Span::styled("# ", label_style), shown]));
    }
    DivinationMethod::Time | DivinationMethod::Random => {}
  }

  if let Some(input) = wb.input() {
    let detail = match &input.payload {
      InputPayload::Coins(v) | InputPayload::Random(v) | InputPayload::Numbers(v) => v
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(" "),
      InputPayload::Time(t) => {
        format!("{}-{:02}-{:02} {:02}:{:02}", t.year, t.month, t.day, t.hour, t.minute)
      }
    };
    lines.push(Line::from(Span::styled(
      format!("✓ {}: {detail}", s.input_ready),
      Style::default().fg(Color::Green),
    )));
  }

  let najia = if wb.include_najia { "[x]" } else { "[ ]" };
  lines.push(Line::from(Span::styled(
    format!("{najia} {}   {}", s.najia_toggle, s.submit_hint),
    Style::default().fg(Color::DarkGray),
  )));

  f.render_widget(Paragraph::new(lines).block(pane_block(s.method, false)), area);
}
