//! Weekly rankings: a bar chart of the leaders, the tabbed leaderboards and
//! the drill-down.

use evalecole_core::views::{DrillDown, HighlightRow, RankRow};
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Bar, BarChart, BarGroup, List, ListItem, ListState, Paragraph},
};

use super::{cursor_style, dim, label_style, pane, score_style, signed};
use crate::app::{App, RankTab};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(board) = &app.rankings.board else {
    let block = pane("Classement");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new("Chargement…").style(dim()), inner);
    return;
  };

  if let Some(drill) = &app.rankings.drill {
    draw_drill(f, area, drill);
    return;
  }

  let [chart_area, tabs_area, list_area] =
    Layout::vertical([Constraint::Length(9), Constraint::Length(1), Constraint::Min(0)])
      .areas(area);
  draw_chart(f, chart_area, &board.top);

  let mut tabs = Vec::new();
  for tab in RankTab::ALL {
    let style = if tab == app.rankings.tab { cursor_style() } else { dim() };
    tabs.push(Span::styled(format!(" {} ", tab.title()), style));
    tabs.push(Span::raw(" "));
  }
  f.render_widget(Paragraph::new(Line::from(tabs)), tabs_area);

  let rows = app.rankings.rows();
  let items: Vec<ListItem> = rows.iter().map(rank_item).collect();
  let mut state = ListState::default();
  state.select((!rows.is_empty()).then_some(app.rankings.cursor));
  f.render_stateful_widget(
    List::new(items).block(pane(app.rankings.tab.title())).highlight_style(cursor_style()),
    list_area,
    &mut state,
  );
}

fn rank_item(row: &RankRow) -> ListItem<'static> {
  let medal = match row.rank {
    1 => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    2 | 3 => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    _ => dim(),
  };
  ListItem::new(Line::from(vec![
    Span::styled(format!("{:>3}. ", row.rank), medal),
    Span::raw(format!("{:<28}", row.user.full_name)),
    Span::styled(format!("{:>12}  ", row.user.role.to_string()), dim()),
    Span::styled(signed(row.score), score_style(row.score)),
  ]))
}

fn draw_chart(f: &mut Frame, area: Rect, top: &[RankRow]) {
  // Bars cannot go below zero; negative scores show as empty bars with their
  // value as text.
  let bars: Vec<Bar> = top
    .iter()
    .map(|row| {
      Bar::default()
        .label(Line::from(row.user.full_name.clone()))
        .value(row.score.max(0) as u64)
        .text_value(signed(row.score))
        .style(score_style(row.score))
    })
    .collect();

  f.render_widget(
    BarChart::default()
      .block(pane("Top de la semaine"))
      .data(BarGroup::default().bars(&bars))
      .bar_width(14)
      .bar_gap(2),
    area,
  );
}

fn highlight_items(rows: &[HighlightRow]) -> Vec<ListItem<'static>> {
  if rows.is_empty() {
    return vec![ListItem::new(Span::styled("Aucun événement", dim()))];
  }
  rows
    .iter()
    .map(|r| {
      ListItem::new(Line::from(vec![
        Span::styled(
          format!("{} ", r.date_time.with_timezone(&chrono::Local).format("%d/%m %H:%M")),
          dim(),
        ),
        Span::styled(format!("{:>3} ", signed(r.points)), score_style(r.points)),
        Span::raw(r.label.clone()),
      ]))
    })
    .collect()
}

fn draw_drill(f: &mut Frame, area: Rect, drill: &DrillDown) {
  let [summary, lists] = Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);

  let block = pane(format!("{} · {}", drill.user.full_name, drill.user.role));
  let inner = block.inner(summary);
  f.render_widget(block, summary);
  f.render_widget(
    Paragraph::new(vec![
      Line::from(vec![
        Span::styled(format!("{:<20}", "Cette semaine"), label_style()),
        Span::styled(signed(drill.weekly_score), score_style(drill.weekly_score)),
      ]),
      Line::from(vec![
        Span::styled(format!("{:<20}", "Depuis le début"), label_style()),
        Span::styled(signed(drill.lifetime_score), score_style(drill.lifetime_score)),
      ]),
    ]),
    inner,
  );

  let [left, right] =
    Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(lists);
  f.render_widget(
    List::new(highlight_items(&drill.positives)).block(pane("Meilleurs moments")),
    left,
  );
  f.render_widget(
    List::new(highlight_items(&drill.negatives)).block(pane("Points à améliorer")),
    right,
  );
}
