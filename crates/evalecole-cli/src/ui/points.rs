//! The add-points screen.

use evalecole_core::{
  catalog::ActionType,
  submission::{ActionChoice, SubmissionStage},
};
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph},
};

use super::{cursor_style, dim, label_style, pane, score_style, signed};
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let state = &app.points;
  if state.flow.stage() == SubmissionStage::Success {
    let block = pane("Ajouter / retirer des points");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new(Line::from(Span::styled(
        "Points enregistrés ! Retour au tableau de bord…",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
      ))),
      inner,
    );
    return;
  }

  let [left, right] =
    Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).areas(area);
  draw_targets(f, left, app);
  draw_actions(f, right, app);
}

fn draw_targets(f: &mut Frame, area: Rect, app: &App) {
  let state = &app.points;
  let selecting = state.flow.stage() == SubmissionStage::SelectingTarget;

  let block = pane(format!("Qui ? ({})", state.targets.len()));
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if state.editing_search || !state.search.is_empty() {
    let bar = Rect { height: 1, ..inner };
    inner.y += 1;
    inner.height = inner.height.saturating_sub(1);
    let text =
      if state.editing_search { format!("/{}_", state.search) } else { format!("/{}", state.search) };
    f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Yellow)), bar);
  }

  let chosen = state.flow.target_id();
  let items: Vec<ListItem> = state
    .targets
    .iter()
    .map(|t| {
      let style = if Some(t.id.as_str()) == chosen {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
      } else {
        Style::default()
      };
      ListItem::new(Line::from(vec![
        Span::styled(t.full_name.clone(), style),
        Span::styled(format!("  {}", t.role), dim()),
      ]))
    })
    .collect();

  let mut list_state = ListState::default();
  list_state.select((selecting && !state.targets.is_empty()).then_some(state.target_cursor));
  f.render_stateful_widget(List::new(items).highlight_style(cursor_style()), inner, &mut list_state);
}

fn draw_actions(f: &mut Frame, area: Rect, app: &App) {
  let state = &app.points;
  let Some(actions) = &state.actions else {
    let block = pane("Action");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new("Choisissez une personne et appuyez sur Entrée.").style(dim()), inner);
    return;
  };

  let stage = state.flow.stage();
  let custom = stage == SubmissionStage::CustomDetails;
  let [list_area, detail_area] = Layout::vertical([
    Constraint::Min(0),
    Constraint::Length(if custom { 6 } else { 3 }),
  ])
  .areas(area);

  let chosen = state.flow.action();
  let mut items: Vec<ListItem> = actions
    .actions
    .iter()
    .map(|a| {
      let marker = if chosen == Some(&ActionChoice::Catalog(a.id.clone())) { "● " } else { "  " };
      let kind = match a.kind {
        ActionType::Positive => Style::default().fg(Color::Green),
        ActionType::Negative => Style::default().fg(Color::Red),
      };
      ListItem::new(Line::from(vec![
        Span::raw(marker),
        Span::styled(format!("{:>3} ", signed(a.points)), kind),
        Span::raw(a.label.clone()),
      ]))
    })
    .collect();
  let custom_marker = if chosen == Some(&ActionChoice::Custom) { "● " } else { "  " };
  items.push(ListItem::new(Line::from(vec![
    Span::raw(custom_marker),
    Span::styled("    Autre (personnalisé)", Style::default().fg(Color::Cyan)),
  ])));

  let mut list_state = ListState::default();
  list_state.select((stage == SubmissionStage::SelectingAction).then_some(state.action_cursor));
  f.render_stateful_widget(
    List::new(items)
      .block(pane(format!("Évaluer {}", actions.target.full_name)))
      .highlight_style(cursor_style()),
    list_area,
    &mut list_state,
  );

  let block = pane(if custom { "Action personnalisée" } else { "Envoi" });
  let inner = block.inner(detail_area);
  f.render_widget(block, detail_area);

  let mut lines = Vec::new();
  if custom {
    lines.push(Line::from(vec![
      Span::styled("Libellé  ", label_style()),
      Span::raw(format!("{}_", state.flow.custom_label())),
    ]));
    let mut spans = vec![Span::styled("Points   ", label_style())];
    for value in state.point_values() {
      let style = if state.flow.custom_points() == Some(*value) {
        cursor_style()
      } else {
        score_style(value.value())
      };
      spans.push(Span::styled(format!(" {} ", signed(value.value())), style));
    }
    lines.push(Line::from(spans));
  }
  let ready = if state.flow.can_submit() {
    Span::styled("Prêt à envoyer", Style::default().fg(Color::Green))
  } else {
    Span::styled("Sélection incomplète", dim())
  };
  lines.push(Line::from(ready));
  if let Some(err) = state.flow.last_error() {
    lines.push(Line::from(Span::styled(err.to_owned(), Style::default().fg(Color::Red))));
  }
  f.render_widget(Paragraph::new(lines), inner);
}
