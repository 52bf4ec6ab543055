//! User management screen.

use evalecole_core::{
  role::Role,
  session::ConfirmStep,
  user::{User, class_label},
};
use ratatui::{
  Frame,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use super::{cursor_style, dim, label_style, pane, score_style, signed};
use crate::app::{AdminState, AdminTab, App, FormField, UserForm};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let admin = &app.admin;
  let [tabs_area, body] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

  let mut tabs = Vec::new();
  for tab in AdminTab::ALL {
    let style = if tab == admin.tab { cursor_style() } else { dim() };
    tabs.push(Span::styled(format!(" {} ", tab.title()), style));
    tabs.push(Span::raw(" "));
  }
  f.render_widget(Paragraph::new(Line::from(tabs)), tabs_area);

  let items: Vec<ListItem> = match admin.tab {
    AdminTab::Students => admin.students().into_iter().map(|u| user_item(u, admin)).collect(),
    AdminTab::Staff => admin.staff().into_iter().map(|u| user_item(u, admin)).collect(),
    AdminTab::Classes => admin
      .classes
      .iter()
      .map(|c| {
        let count =
          admin.users.iter().filter(|u| u.class_id.as_deref() == Some(c.id.as_str())).count();
        ListItem::new(Line::from(vec![
          Span::raw(format!("{:<24}", c.name)),
          Span::styled(format!("{count} élève(s)"), dim()),
        ]))
      })
      .collect(),
    AdminTab::Points => admin
      .scores()
      .into_iter()
      .map(|(u, score)| {
        ListItem::new(Line::from(vec![
          Span::raw(format!("{:<28}", u.full_name)),
          Span::styled(format!("{:<14}", u.role.to_string()), dim()),
          Span::styled(signed(score), score_style(score)),
        ]))
      })
      .collect(),
  };

  let mut state = ListState::default();
  state.select((admin.row_count() > 0).then_some(admin.cursor));
  f.render_stateful_widget(
    List::new(items)
      .block(pane(format!("{} ({})", admin.tab.title(), admin.row_count())))
      .highlight_style(cursor_style()),
    body,
    &mut state,
  );

  if let Some(form) = &admin.form {
    draw_form(f, body, form, admin);
  } else if let Some(name) = &admin.class_input {
    draw_input(f, body, "Nouvelle classe", "Nom", name);
  } else if let Some(adjust) = &admin.adjust {
    let title = format!("Ajuster le score de {} (actuel : {})", adjust.full_name, adjust.current);
    draw_input(f, body, &title, "Nouveau total", &adjust.input);
  }

  if let (Some(prompt), Some((_, step))) = (admin.gate.prompt(), admin.gate.pending()) {
    draw_confirm(f, body, &prompt, step);
  }
}

fn user_item<'a>(user: &User, admin: &AdminState) -> ListItem<'a> {
  let style = if user.active { Style::default() } else { dim() };
  let detail = match user.role {
    Role::Student => class_label(user.class_id.as_deref(), &admin.classes).to_owned(),
    Role::Teacher => {
      let names: Vec<&str> = admin
        .classes
        .iter()
        .filter(|c| user.teaches(&c.id))
        .map(|c| c.name.as_str())
        .collect();
      names.join(", ")
    }
    _ => String::new(),
  };
  let state = if user.active { "" } else { "  (inactif)" };
  ListItem::new(Line::from(vec![
    Span::styled(format!("{:<28}", user.full_name), style),
    Span::styled(format!("{:<14}", user.role.to_string()), dim()),
    Span::styled(format!("{detail}{state}"), dim()),
  ]))
}

fn popup(area: Rect, width: u16, height: u16) -> Rect {
  let [column] = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center).areas(area);
  let [row] = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center).areas(column);
  row
}

fn draw_form(f: &mut Frame, area: Rect, form: &UserForm, admin: &AdminState) {
  let fields = form.fields();
  let height = fields.len() as u16 * 2 + 2 + if form.current() == FormField::Assigned { 2 } else { 0 };
  let rect = popup(area, 64, height);
  let title = if form.user_id.is_some() { "Modifier l'utilisateur" } else { "Nouvel utilisateur" };
  let block = pane(title);
  let inner = block.inner(rect);
  f.render_widget(Clear, rect);
  f.render_widget(block, rect);

  let current = form.current();
  let draft = &form.draft;
  let mut lines = Vec::new();
  for field in fields {
    let value = match field {
      FormField::FullName => draft.full_name.clone(),
      FormField::Username => draft.username.clone(),
      FormField::Password => draft.password.clone(),
      FormField::Role => format!("◀ {} ▶", draft.role),
      FormField::Active => (if draft.active { "[x]" } else { "[ ]" }).to_owned(),
      FormField::Class => format!("◀ {} ▶", class_label(draft.class_id.as_deref(), &admin.classes)),
      FormField::Assigned => {
        let names: Vec<&str> = admin
          .classes
          .iter()
          .filter(|c| draft.assigned_class_ids.contains(&c.id))
          .map(|c| c.name.as_str())
          .collect();
        if names.is_empty() { "aucune".to_owned() } else { names.join(", ") }
      }
    };
    let focused = field == current;
    let value = if focused && field.is_text() { format!("{value}_") } else { value };
    lines.push(Line::from(vec![
      Span::styled(format!("{:<20}", field.label()), label_style()),
      Span::styled(value, if focused { cursor_style() } else { Style::default() }),
    ]));
    lines.push(Line::from(""));
  }

  if current == FormField::Assigned {
    let picker: Vec<Span> = admin
      .classes
      .iter()
      .enumerate()
      .map(|(i, c)| {
        let checked = draft.assigned_class_ids.contains(&c.id);
        let text = format!(" {}{} ", if checked { "✓" } else { "" }, c.name);
        let style = if i == form.class_cursor {
          cursor_style()
        } else if checked {
          Style::default().fg(Color::Green)
        } else {
          dim()
        };
        Span::styled(text, style)
      })
      .collect();
    lines.push(Line::from(picker));
  }

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_input(f: &mut Frame, area: Rect, title: &str, label: &str, value: &str) {
  let rect = popup(area, 60, 3);
  let block = pane(title);
  let inner = block.inner(rect);
  f.render_widget(Clear, rect);
  f.render_widget(block, rect);
  f.render_widget(
    Paragraph::new(Line::from(vec![
      Span::styled(format!("{label}  "), label_style()),
      Span::raw(format!("{value}_")),
    ])),
    inner,
  );
}

fn draw_confirm(f: &mut Frame, area: Rect, prompt: &str, step: ConfirmStep) {
  let rect = popup(area, 60, 6);
  let title = match step {
    ConfirmStep::First => "Confirmation",
    ConfirmStep::Final => "Confirmation finale",
  };
  let block = pane(title).border_style(Style::default().fg(Color::Red));
  let inner = block.inner(rect);
  f.render_widget(Clear, rect);
  f.render_widget(block, rect);
  f.render_widget(
    Paragraph::new(vec![
      Line::from(Span::styled(
        prompt.to_owned(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
      )),
      Line::from(""),
      Line::from(Span::styled("[o] oui   [n] non", dim())),
    ])
    .wrap(Wrap { trim: true }),
    inner,
  );
}
