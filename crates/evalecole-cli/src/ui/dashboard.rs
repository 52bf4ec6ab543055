//! Dashboard figures and the class roster.

use evalecole_core::{navigation::Route, views::Member};
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{List, ListItem, Paragraph},
};

use super::{dim, label_style, pane, score_style, signed};
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = pane("Tableau de bord");
  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(view) = &app.dashboard else {
    f.render_widget(Paragraph::new("Chargement…").style(dim()), inner);
    return;
  };

  let window = format!(
    "Semaine du {} au {}",
    view.window.start.with_timezone(&chrono::Local).format("%d/%m"),
    view.window.end.with_timezone(&chrono::Local).format("%d/%m"),
  );
  let mut lines = vec![
    Line::from(Span::styled(view.greeting.clone(), Style::default().add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(window, dim())),
    Line::from(""),
  ];

  let stat = |label: &str, value: Span<'static>| {
    Line::from(vec![Span::styled(format!("{label:<28}"), label_style()), value])
  };

  if let Some(given) = view.stats.actions_given_this_week {
    lines.push(stat("Actions données cette semaine", Span::raw(given.to_string())));
  }
  if let Some(score) = view.stats.my_weekly_score {
    lines.push(stat("Mon score de la semaine", Span::styled(signed(score), score_style(score))));
  }
  let leader = match &view.stats.weekly_leader {
    Some(l) => Span::styled(
      format!("{} ({})", l.full_name, signed(l.score)),
      Style::default().fg(Color::Yellow),
    ),
    None => Span::styled("Aucun point cette semaine", dim()),
  };
  lines.push(stat("En tête cette semaine", leader));

  if !view.quick_links.is_empty() {
    lines.push(Line::from(""));
    let links: Vec<Span> = view
      .quick_links
      .iter()
      .filter_map(|r| match r {
        Route::AddPoints => Some("[a] Ajouter des points  "),
        Route::Rankings => Some("[c] Voir le classement  "),
        _ => None,
      })
      .map(|s| Span::styled(s, Style::default().fg(Color::Cyan)))
      .collect();
    lines.push(Line::from(links));
  }

  f.render_widget(Paragraph::new(lines), inner);
}

fn member_items(members: &[Member]) -> Vec<ListItem<'static>> {
  members
    .iter()
    .map(|m| {
      let style = if m.active { Style::default() } else { dim() };
      ListItem::new(Line::from(Span::styled(m.full_name.clone(), style)))
    })
    .collect()
}

pub fn draw_roster(f: &mut Frame, area: Rect, app: &App) {
  let Some(roster) = &app.roster else {
    let block = pane("Ma classe");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new("Chargement…").style(dim()), inner);
    return;
  };

  let [title_area, body] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);
  f.render_widget(
    Paragraph::new(Span::styled(format!(" {}", roster.title), label_style())),
    title_area,
  );

  let [left, right] =
    Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);
  f.render_widget(
    List::new(member_items(&roster.students))
      .block(pane(format!("Élèves ({})", roster.students.len()))),
    left,
  );
  f.render_widget(
    List::new(member_items(&roster.teachers))
      .block(pane(format!("Professeurs ({})", roster.teachers.len()))),
    right,
  );
}
