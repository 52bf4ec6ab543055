//! Login form and the provisioning screen.

use ratatui::{
  Frame,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Color, Style},
  text::{Line, Span},
  widgets::{Paragraph, Wrap},
};

use super::{cursor_style, dim, label_style, pane};
use crate::app::{App, LoginField};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let [column] = Layout::horizontal([Constraint::Length(50)]).flex(Flex::Center).areas(area);
  let [form_area] = Layout::vertical([Constraint::Length(9)]).flex(Flex::Center).areas(column);

  let block = pane("Connexion");
  let inner = block.inner(form_area);
  f.render_widget(block, form_area);

  let field = |label: &'static str, value: String, focused: bool| {
    let shown = if focused { format!("{value}_") } else { value };
    let style = if focused { cursor_style() } else { Style::default() };
    Line::from(vec![Span::styled(format!("{label:<16}"), label_style()), Span::styled(shown, style)])
  };

  let form = &app.login;
  let mut lines = vec![
    Line::from(""),
    field("Identifiant", form.username.clone(), form.field == LoginField::Username),
    Line::from(""),
    field(
      "Mot de passe",
      "•".repeat(form.password.chars().count()),
      form.field == LoginField::Password,
    ),
    Line::from(""),
  ];
  if let Some(err) = &form.error {
    lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
  }

  f.render_widget(Paragraph::new(lines), inner);
}

pub fn draw_setup(f: &mut Frame, area: Rect, app: &App) {
  let block = pane("Base de données non initialisée");
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = vec![
    Line::from(Span::styled(
      "Les tables n'existent pas encore. Exécutez ce script sur la base, puis appuyez sur r.",
      Style::default().fg(Color::Yellow),
    )),
    Line::from(""),
  ];
  lines.extend(app.setup_script.lines().map(|l| Line::from(Span::styled(l.to_owned(), dim()))));

  f.render_widget(
    Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((app.setup_scroll, 0)),
    inner,
  );
}
