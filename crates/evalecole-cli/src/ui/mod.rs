//! TUI rendering: header, route tabs, body and status bar.

pub mod admin;
pub mod dashboard;
pub mod login;
pub mod points;
pub mod rankings;

use chrono::Local;
use evalecole_core::{navigation::Route, submission::SubmissionStage};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, Screen};

// ─── Shared styles ───────────────────────────────────────────────────────────

pub(crate) fn pane(title: impl Into<String>) -> Block<'static> {
  Block::default()
    .title(format!(" {} ", title.into()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

pub(crate) fn cursor_style() -> Style {
  Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
}

pub(crate) fn label_style() -> Style {
  Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

pub(crate) fn dim() -> Style { Style::default().fg(Color::DarkGray) }

/// Green for gains, red for losses.
pub(crate) fn score_style(score: impl Into<i64>) -> Style {
  match score.into() {
    s if s > 0 => Style::default().fg(Color::Green),
    s if s < 0 => Style::default().fg(Color::Red),
    _ => Style::default(),
  }
}

pub(crate) fn signed(points: impl Into<i64>) -> String {
  let points = points.into();
  if points > 0 { format!("+{points}") } else { points.to_string() }
}

// ─── Root draw ───────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Length(1), // route tabs
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_tabs(f, rows[1], app);
  match app.screen {
    Screen::Setup => login::draw_setup(f, rows[2], app),
    Screen::Login => login::draw(f, rows[2], app),
    Screen::Main => draw_route(f, rows[2], app),
  }
  draw_status(f, rows[3], app);
}

// ─── Header ──────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%d/%m/%Y").to_string();

  let who = match &app.session {
    Some(s) => match &app.class_name {
      Some(class) => format!("  {} · {} · {class}", s.user().full_name, s.role()),
      None => format!("  {} · {}", s.user().full_name, s.role()),
    },
    None => String::new(),
  };

  let left = Span::styled(
    format!(" Éval'École{who}"),
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::Gray));

  let pad = (area.width as usize)
    .saturating_sub(left.content.chars().count())
    .saturating_sub(right.content.chars().count());
  let line = Line::from(vec![left, Span::raw(" ".repeat(pad)), right]);

  f.render_widget(Paragraph::new(line).style(Style::default().bg(Color::DarkGray)), area);
}

fn draw_tabs(f: &mut Frame, area: Rect, app: &App) {
  if app.screen != Screen::Main {
    return;
  }
  let mut spans = Vec::new();
  for (i, route) in app.menu.iter().enumerate() {
    let style = if *route == app.route { cursor_style() } else { Style::default() };
    spans.push(Span::styled(format!(" {} {} ", i + 1, route.title()), style));
    spans.push(Span::raw(" "));
  }
  f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_route(f: &mut Frame, area: Rect, app: &App) {
  match app.route {
    Route::Dashboard => dashboard::draw(f, area, app),
    Route::MyClass => dashboard::draw_roster(f, area, app),
    Route::AddPoints => points::draw(f, area, app),
    Route::Rankings => rankings::draw(f, area, app),
    Route::UserManagement => admin::draw(f, area, app),
  }
}

// ─── Status bar ──────────────────────────────────────────────────────────────

fn hints(app: &App) -> (&'static str, &'static str) {
  match app.screen {
    Screen::Setup => ("SETUP", "↑↓ défiler  r réessayer  q quitter"),
    Screen::Login => ("LOGIN", "Tab champ suivant  Entrée valider  Esc quitter"),
    Screen::Main => match app.route {
      Route::AddPoints if app.points.editing_search => {
        ("RECHERCHE", "Tapez un nom  Entrée chercher  Esc annuler")
      }
      Route::AddPoints => match app.points.flow.stage() {
        SubmissionStage::SelectingTarget => ("CIBLE", "↑↓ choisir  / chercher  Entrée valider"),
        SubmissionStage::SelectingAction => {
          ("ACTION", "↑↓ choisir  Entrée sélectionner/envoyer  s envoyer  Esc retour")
        }
        SubmissionStage::CustomDetails => {
          ("DÉTAIL", "Tapez le libellé  ←→ points  Entrée envoyer  Esc retour")
        }
        SubmissionStage::Submitting => ("ENVOI", "Envoi en cours…"),
        SubmissionStage::Success => ("OK", "Points enregistrés"),
      },
      Route::Rankings if app.rankings.drill.is_some() => ("DÉTAIL", "Esc retour"),
      Route::Rankings => ("CLASSEMENT", "←→ onglet  ↑↓ choisir  Entrée détail  F5 rafraîchir"),
      Route::UserManagement if app.admin.gate.pending().is_some() => {
        ("CONFIRMER", "o oui  n non")
      }
      Route::UserManagement if app.admin.form.is_some() => {
        ("FORMULAIRE", "↑↓ champ  ←→ choisir  Espace cocher  Entrée enregistrer  Esc annuler")
      }
      Route::UserManagement if app.admin.is_typing() => {
        ("SAISIE", "Entrée valider  Esc annuler")
      }
      Route::UserManagement => (
        "ADMIN",
        "←→ onglet  n nouveau  e modifier  a activer  s score  d supprimer  r/R remise à zéro",
      ),
      Route::Dashboard => ("ACCUEIL", "a ajouter des points  c classement  Tab vue suivante"),
      Route::MyClass => ("CLASSE", "Tab vue suivante  x déconnexion  q quitter"),
    },
  }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode, hints) = hints(app);
  let status = if app.status_msg.is_empty() { hints.to_owned() } else { app.status_msg.clone() };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode} "),
      Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {status}"), dim()),
  ]);
  f.render_widget(Paragraph::new(line).style(Style::default().bg(Color::Black)), area);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn signed_points_carry_their_sign() {
    assert_eq!(signed(3), "+3");
    assert_eq!(signed(-2), "-2");
    assert_eq!(signed(0), "0");
    assert_eq!(signed(i64::from(i32::MAX) + 5), "+2147483652");
  }
}
