//! Result pane: view tabs, the selected hexagram, najia and interpretation.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Tabs, Wrap},
};
use strum::IntoEnumIterator;
use yijing_core::{
  hexagram::{Hexagram, LineKind},
  najia::{NajiaDivinationResult, NajiaHexagramInfo},
};

use super::pane_block;
use crate::{
  i18n::Strings,
  workbench::{ViewMode, Workbench},
};

pub fn draw(f: &mut Frame, area: Rect, wb: &Workbench, s: &Strings) {
  let block = pane_block(s.interpretation, false);
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(result) = wb.result() else {
    f.render_widget(
      Paragraph::new(s.no_result).style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  };

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(0)])
    .split(inner);

  // Tabs for the views; unavailable ones are dimmed.
  let titles: Vec<Line> = ViewMode::iter()
    .map(|v| {
      let style = if wb.can_select(v) {
        Style::default()
      } else {
        Style::default().fg(Color::DarkGray)
      };
      Line::from(Span::styled(v.label(s), style))
    })
    .collect();
  let selected = ViewMode::iter().position(|v| v == wb.view()).unwrap_or(0);
  f.render_widget(
    Tabs::new(titles)
      .select(selected)
      .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    rows[0],
  );

  let mut lines: Vec<Line> = Vec::new();
  if let Some(record) = wb.viewing_record() {
    lines.push(Line::from(Span::styled(
      format!("{} #{record}", s.viewing_record),
      Style::default().fg(Color::Magenta),
    )));
  }
  if wb.is_refreshing() {
    lines.push(Line::from(Span::styled(s.divining, Style::default().fg(Color::Yellow))));
  }

  match wb.view() {
    ViewMode::Original => hexagram_lines(&mut lines, &result.original_hexagram, s),
    ViewMode::Changed => {
      if let Some(h) = &result.changed_hexagram {
        hexagram_lines(&mut lines, h, s);
      }
    }
    ViewMode::Mutual => {
      if let Some(h) = &result.mutual_hexagram {
        hexagram_lines(&mut lines, h, s);
      }
    }
    ViewMode::Najia => {
      if let Some(n) = wb.najia() {
        najia_lines(&mut lines, n, s);
      }
    }
  }

  let changes = if result.change_info.has_changes {
    let positions: Vec<String> =
      result.change_info.changing_lines.iter().map(u8::to_string).collect();
    format!("{}: {}", s.changing_lines, positions.join(", "))
  } else {
    s.no_changes.to_owned()
  };
  lines.push(Line::from(Span::styled(changes, Style::default().fg(Color::Cyan))));
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    s.interpretation,
    Style::default().add_modifier(Modifier::BOLD),
  )));
  lines.extend(result.interpretation.lines().map(|l| Line::from(l.to_owned())));

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), rows[1]);
}

/// Glyph for one line: solid for yang, broken for yin, with the classical
/// change marks.
fn line_glyph(kind: LineKind, changing: bool) -> &'static str {
  match (kind, changing) {
    (LineKind::Yang, false) => "━━━━━━━━━  ",
    (LineKind::Yang, true) => "━━━━━━━━━ ○",
    (LineKind::Yin, false) => "━━━━   ━━━━  ",
    (LineKind::Yin, true) => "━━━━   ━━━━ ×",
  }
}

fn hexagram_lines(out: &mut Vec<Line<'static>>, h: &Hexagram, s: &Strings) {
  out.push(Line::from(vec![
    Span::styled(
      format!("{} {} ", h.symbol, h.number),
      Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ),
    Span::styled(h.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
    Span::raw(format!("  {}", h.chinese_name)),
  ]));
  for line in h.lines.iter().rev() {
    let style = if line.changing { Style::default().fg(Color::Red) } else { Style::default() };
    let mut spans = vec![Span::styled(format!("  {}", line_glyph(line.kind, line.changing)), style)];
    if let Some(text) = line.text() {
      spans.push(Span::styled(format!("  {text}"), Style::default().fg(Color::Gray)));
    }
    out.push(Line::from(spans));
  }
  if let Some(kw) = &h.king_wen {
    out.push(Line::from(format!("{}: {}", s.judgement, kw.text)));
  }
  if let Some(image) = &h.image {
    out.push(Line::from(format!("{}: {}", s.image, image.text)));
  }
  out.push(Line::from(""));
}

fn najia_hexagram(out: &mut Vec<Line<'static>>, info: &NajiaHexagramInfo, s: &Strings) {
  out.push(Line::from(Span::styled(
    format!("{} · {} · {}", info.name, info.palace, info.wuxing),
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
  )));
  for l in info.lines_top_down() {
    let mark = if l.shi_yao {
      s.world_line
    } else if l.ying_yao {
      s.response_line
    } else {
      ""
    };
    let void = if l.xunkong { s.void_lines } else { "" };
    out.push(Line::from(format!(
      "  {}  {} {} {} {}  {mark} {void}",
      line_glyph(l.yao_type, l.changing),
      l.liushen,
      l.liuqin,
      l.najia,
      l.wuxing,
    )));
  }
}

fn najia_lines(out: &mut Vec<Line<'static>>, n: &NajiaDivinationResult, s: &Strings) {
  let g = &n.ganzhi_time;
  out.push(Line::from(format!(
    "{} {} {} {}  ({}: {})",
    g.year_gz,
    g.month_gz,
    g.day_gz,
    g.hour_gz,
    s.void_lines,
    g.xunkong.join("")
  )));
  najia_hexagram(out, &n.original_hexagram, s);
  if let Some(changed) = &n.changed_hexagram {
    najia_hexagram(out, changed, s);
  }
  if !n.traditional_interpretation.is_empty() {
    out.push(Line::from(n.traditional_interpretation.clone()));
  }
  out.push(Line::from(""));
}
