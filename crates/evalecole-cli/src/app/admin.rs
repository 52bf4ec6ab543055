//! User management: rosters, the user form, classes, scores and resets.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use evalecole_core::{
  event::PointEvent,
  role::Role,
  scoring::lifetime_score,
  session::{ConfirmGate, DestructiveOp},
  user::{ClassGroup, User},
  views::UserDraft,
};

use super::App;
use crate::client::ApiClient;

/// Form order of the role picker.
const ROLES: [Role; 6] = [
  Role::Student,
  Role::Teacher,
  Role::Supervisor,
  Role::Direction,
  Role::Accounting,
  Role::Admin,
];

// ─── Tabs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
  #[default]
  Students,
  Staff,
  Classes,
  /// Adults with their lifetime score, and the resets.
  Points,
}

impl AdminTab {
  pub const ALL: [AdminTab; 4] =
    [AdminTab::Students, AdminTab::Staff, AdminTab::Classes, AdminTab::Points];

  pub fn title(self) -> &'static str {
    match self {
      AdminTab::Students => "Élèves",
      AdminTab::Staff => "Personnel",
      AdminTab::Classes => "Classes",
      AdminTab::Points => "Points",
    }
  }

  fn shift(self, forward: bool) -> Self {
    let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
    let n = Self::ALL.len();
    Self::ALL[if forward { (i + 1) % n } else { (i + n - 1) % n }]
  }
}

// ─── User form ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
  FullName,
  Username,
  Password,
  Role,
  Active,
  Class,
  Assigned,
}

impl FormField {
  pub fn label(self) -> &'static str {
    match self {
      FormField::FullName => "Nom complet",
      FormField::Username => "Identifiant",
      FormField::Password => "Mot de passe",
      FormField::Role => "Rôle",
      FormField::Active => "Actif",
      FormField::Class => "Classe",
      FormField::Assigned => "Classes assignées",
    }
  }

  pub fn is_text(self) -> bool {
    matches!(self, FormField::FullName | FormField::Username | FormField::Password)
  }
}

#[derive(Debug, Clone)]
pub struct UserForm {
  /// `None` while creating.
  pub user_id:      Option<String>,
  pub draft:        UserDraft,
  pub field:        usize,
  /// Highlighted entry of the class pickers.
  pub class_cursor: usize,
}

impl UserForm {
  pub fn create(role: Role, classes: &[ClassGroup]) -> Self {
    let mut form = Self {
      user_id:      None,
      draft:        UserDraft {
        full_name: String::new(),
        username: String::new(),
        password: String::new(),
        role,
        active: true,
        class_id: None,
        assigned_class_ids: Vec::new(),
      },
      field:        0,
      class_cursor: 0,
    };
    form.default_class(classes);
    form
  }

  pub fn edit(user: &User, classes: &[ClassGroup]) -> Self {
    let class_cursor = user
      .class_id
      .as_deref()
      .and_then(|id| classes.iter().position(|c| c.id == id))
      .unwrap_or(0);
    Self {
      user_id: Some(user.id.clone()),
      draft: UserDraft::from_user(user),
      field: 0,
      class_cursor,
    }
  }

  /// The fields shown for the drafted role.
  pub fn fields(&self) -> Vec<FormField> {
    let mut fields = vec![FormField::FullName];
    if self.draft.role.has_credentials() {
      fields.extend([FormField::Username, FormField::Password]);
    }
    fields.extend([FormField::Role, FormField::Active]);
    match self.draft.role {
      Role::Student => fields.push(FormField::Class),
      Role::Teacher => fields.push(FormField::Assigned),
      _ => {}
    }
    fields
  }

  pub fn current(&self) -> FormField {
    let fields = self.fields();
    fields[self.field.min(fields.len() - 1)]
  }

  pub fn move_field(&mut self, forward: bool) {
    let n = self.fields().len();
    self.field = if forward { (self.field + 1) % n } else { (self.field + n - 1) % n };
  }

  fn text_mut(&mut self) -> Option<&mut String> {
    match self.current() {
      FormField::FullName => Some(&mut self.draft.full_name),
      FormField::Username => Some(&mut self.draft.username),
      FormField::Password => Some(&mut self.draft.password),
      _ => None,
    }
  }

  pub fn type_char(&mut self, c: char, classes: &[ClassGroup]) {
    match self.text_mut() {
      Some(text) => text.push(c),
      None if c == ' ' => self.toggle(classes),
      None => {}
    }
  }

  pub fn backspace(&mut self) {
    if let Some(text) = self.text_mut() {
      text.pop();
    }
  }

  /// Left/right on a picker.
  pub fn cycle(&mut self, forward: bool, classes: &[ClassGroup]) {
    match self.current() {
      FormField::Role => {
        let i = ROLES.iter().position(|r| *r == self.draft.role).unwrap_or(0);
        let n = ROLES.len();
        self.draft.role = ROLES[if forward { (i + 1) % n } else { (i + n - 1) % n }];
        self.default_class(classes);
        // Credential fields come and go with the role.
        self.field = self.fields().iter().position(|f| *f == FormField::Role).unwrap_or(0);
      }
      FormField::Class | FormField::Assigned if !classes.is_empty() => {
        let n = classes.len();
        self.class_cursor =
          if forward { (self.class_cursor + 1) % n } else { (self.class_cursor + n - 1) % n };
        if self.current() == FormField::Class {
          self.draft.class_id = Some(classes[self.class_cursor].id.clone());
        }
      }
      FormField::Active => self.draft.active = !self.draft.active,
      _ => {}
    }
  }

  /// Space on a checkbox.
  pub fn toggle(&mut self, classes: &[ClassGroup]) {
    match self.current() {
      FormField::Active => self.draft.active = !self.draft.active,
      FormField::Assigned => {
        let Some(class) = classes.get(self.class_cursor) else {
          return;
        };
        let assigned = &mut self.draft.assigned_class_ids;
        match assigned.iter().position(|id| *id == class.id) {
          Some(i) => {
            assigned.remove(i);
          }
          None => assigned.push(class.id.clone()),
        }
      }
      _ => {}
    }
  }

  fn default_class(&mut self, classes: &[ClassGroup]) {
    if self.draft.role == Role::Student && self.draft.class_id.is_none() {
      self.class_cursor = 0;
      self.draft.class_id = classes.first().map(|c| c.id.clone());
    }
  }
}

// ─── Score adjustment ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AdjustForm {
  pub user_id:   String,
  pub full_name: String,
  pub current:   i64,
  pub input:     String,
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct AdminState {
  pub tab:         AdminTab,
  pub users:       Vec<User>,
  pub classes:     Vec<ClassGroup>,
  pub events:      Vec<PointEvent>,
  pub cursor:      usize,
  pub gate:        ConfirmGate,
  pub form:        Option<UserForm>,
  /// Name typed for a new class.
  pub class_input: Option<String>,
  pub adjust:      Option<AdjustForm>,
}

impl AdminState {
  pub fn students(&self) -> Vec<&User> {
    self.users.iter().filter(|u| u.role == Role::Student).collect()
  }

  pub fn staff(&self) -> Vec<&User> { self.users.iter().filter(|u| u.role.is_staff()).collect() }

  /// Adults and their lifetime score, in roster order.
  pub fn scores(&self) -> Vec<(&User, i64)> {
    self
      .users
      .iter()
      .filter(|u| u.role.is_adult())
      .map(|u| (u, lifetime_score(&u.id, &self.events)))
      .collect()
  }

  pub fn row_count(&self) -> usize {
    match self.tab {
      AdminTab::Students => self.students().len(),
      AdminTab::Staff => self.staff().len(),
      AdminTab::Classes => self.classes.len(),
      AdminTab::Points => self.scores().len(),
    }
  }

  pub fn selected_user(&self) -> Option<&User> {
    match self.tab {
      AdminTab::Students => self.students().get(self.cursor).copied(),
      AdminTab::Staff => self.staff().get(self.cursor).copied(),
      AdminTab::Points => self.scores().get(self.cursor).map(|(u, _)| *u),
      AdminTab::Classes => None,
    }
  }

  pub fn selected_class(&self) -> Option<&ClassGroup> {
    match self.tab {
      AdminTab::Classes => self.classes.get(self.cursor),
      _ => None,
    }
  }

  pub fn is_typing(&self) -> bool {
    self.form.is_some() || self.class_input.is_some() || self.adjust.is_some()
  }

  pub async fn reload(&mut self, client: &ApiClient) -> Result<()> {
    let (users, classes, events) =
      tokio::try_join!(client.users(), client.classes(), client.events())?;
    self.users = users;
    self.classes = classes;
    self.events = events;
    self.cursor = self.cursor.min(self.row_count().saturating_sub(1));
    Ok(())
  }
}

// ─── Keys ────────────────────────────────────────────────────────────────────

impl App {
  async fn reload_admin(&mut self) {
    if let Err(e) = self.admin.reload(&self.client).await {
      self.fail(e);
    }
  }

  pub(super) async fn handle_admin_key(&mut self, key: KeyEvent) {
    if self.admin.gate.pending().is_some() {
      match key.code {
        KeyCode::Char('o') | KeyCode::Char('y') | KeyCode::Enter => {
          if let Some(op) = self.admin.gate.confirm() {
            self.execute(op).await;
          }
        }
        KeyCode::Char('n') | KeyCode::Esc => self.admin.gate.cancel(),
        _ => {}
      }
      return;
    }
    if self.admin.form.is_some() {
      self.handle_form_key(key).await;
      return;
    }
    if self.admin.class_input.is_some() {
      self.handle_class_input_key(key).await;
      return;
    }
    if self.admin.adjust.is_some() {
      self.handle_adjust_key(key).await;
      return;
    }

    let admin = &mut self.admin;
    match key.code {
      KeyCode::Left | KeyCode::Char('h') | KeyCode::Right | KeyCode::Char('l') => {
        let forward = matches!(key.code, KeyCode::Right | KeyCode::Char('l'));
        admin.tab = admin.tab.shift(forward);
        admin.cursor = 0;
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if admin.cursor + 1 < admin.row_count() {
          admin.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => admin.cursor = admin.cursor.saturating_sub(1),

      KeyCode::Char('n') => match admin.tab {
        AdminTab::Students => admin.form = Some(UserForm::create(Role::Student, &admin.classes)),
        AdminTab::Staff => admin.form = Some(UserForm::create(Role::Teacher, &admin.classes)),
        AdminTab::Classes => admin.class_input = Some(String::new()),
        AdminTab::Points => {}
      },
      KeyCode::Enter | KeyCode::Char('e')
        if matches!(admin.tab, AdminTab::Students | AdminTab::Staff) =>
      {
        if let Some(user) = admin.selected_user() {
          admin.form = Some(UserForm::edit(user, &admin.classes));
        }
      }
      KeyCode::Char('a') if matches!(admin.tab, AdminTab::Students | AdminTab::Staff) => {
        self.toggle_active().await;
      }
      KeyCode::Char('s') if matches!(admin.tab, AdminTab::Staff | AdminTab::Points) => {
        self.open_adjust().await;
      }

      KeyCode::Char('d') => {
        let op = match admin.tab {
          AdminTab::Students | AdminTab::Staff => admin.selected_user().map(|u| {
            DestructiveOp::DeleteUser { user_id: u.id.clone(), full_name: u.full_name.clone() }
          }),
          AdminTab::Classes => admin.selected_class().map(|c| DestructiveOp::DeleteClass {
            class_id: c.id.clone(),
            name:     c.name.clone(),
          }),
          AdminTab::Points => None,
        };
        if let Some(op) = op {
          admin.gate.request(op);
        }
      }
      KeyCode::Char('r') if admin.tab == AdminTab::Points => {
        if let Some(u) = admin.selected_user() {
          let op = DestructiveOp::ResetUserPoints {
            user_id:   u.id.clone(),
            full_name: u.full_name.clone(),
          };
          admin.gate.request(op);
        }
      }
      KeyCode::Char('R') if admin.tab == AdminTab::Points => {
        admin.gate.request(DestructiveOp::ResetAllPoints);
      }
      _ => {}
    }
  }

  async fn execute(&mut self, op: DestructiveOp) {
    let result = match &op {
      DestructiveOp::ResetAllPoints => self.client.reset_all().await,
      DestructiveOp::ResetUserPoints { user_id, .. } => self.client.reset_user(user_id).await,
      DestructiveOp::DeleteUser { user_id, .. } => self.client.delete_user(user_id).await,
      DestructiveOp::DeleteClass { class_id, .. } => self.client.delete_class(class_id).await,
    };
    match result {
      Ok(()) => {
        tracing::info!(?op, "administrative operation applied");
        self.status_msg = match &op {
          DestructiveOp::ResetAllPoints => "Tous les points ont été supprimés.".to_owned(),
          DestructiveOp::ResetUserPoints { full_name, .. } => {
            format!("Points de {full_name} remis à zéro.")
          }
          DestructiveOp::DeleteUser { full_name, .. } => format!("{full_name} supprimé."),
          DestructiveOp::DeleteClass { name, .. } => format!("Classe {name} supprimée."),
        };
        self.reload_admin().await;
      }
      Err(e) => self.fail(e),
    }
  }

  async fn toggle_active(&mut self) {
    let Some(user) = self.admin.selected_user() else {
      return;
    };
    let id = user.id.clone();
    let mut draft = UserDraft::from_user(user);
    draft.active = !draft.active;

    match self.client.update_user(&id, &draft).await {
      Ok(user) => {
        tracing::info!(user = %user.id, active = user.active, "user activation changed");
        self.reload_admin().await;
      }
      Err(e) => self.fail(e),
    }
  }

  async fn open_adjust(&mut self) {
    let Some(user) = self.admin.selected_user().filter(|u| u.role.is_adult()) else {
      return;
    };
    let (id, full_name) = (user.id.clone(), user.full_name.clone());

    match self.client.score(&id).await {
      Ok(report) => {
        self.admin.adjust = Some(AdjustForm {
          user_id: id,
          full_name,
          current: report.lifetime_score,
          input: report.lifetime_score.to_string(),
        });
      }
      Err(e) => self.fail(e),
    }
  }

  async fn handle_form_key(&mut self, key: KeyEvent) {
    let admin = &mut self.admin;
    let Some(form) = admin.form.as_mut() else {
      return;
    };
    let classes = &admin.classes;
    match key.code {
      KeyCode::Esc => admin.form = None,
      KeyCode::Enter => self.save_form().await,
      KeyCode::Up | KeyCode::BackTab => form.move_field(false),
      KeyCode::Down | KeyCode::Tab => form.move_field(true),
      KeyCode::Left => form.cycle(false, classes),
      KeyCode::Right => form.cycle(true, classes),
      KeyCode::Backspace => form.backspace(),
      KeyCode::Char(c) => form.type_char(c, classes),
      _ => {}
    }
  }

  async fn save_form(&mut self) {
    let Some(form) = &self.admin.form else {
      return;
    };
    let result = match &form.user_id {
      Some(id) => self.client.update_user(id, &form.draft).await,
      None => self.client.create_user(&form.draft).await,
    };
    match result {
      Ok(user) => {
        tracing::info!(user = %user.id, "user saved");
        self.admin.form = None;
        self.status_msg = format!("{} enregistré.", user.full_name);
        self.reload_admin().await;
      }
      Err(e) => self.fail(e),
    }
  }

  async fn handle_class_input_key(&mut self, key: KeyEvent) {
    let Some(input) = self.admin.class_input.as_mut() else {
      return;
    };
    match key.code {
      KeyCode::Esc => self.admin.class_input = None,
      KeyCode::Backspace => {
        input.pop();
      }
      KeyCode::Char(c) => input.push(c),
      KeyCode::Enter => {
        let name = input.trim().to_owned();
        if name.is_empty() {
          return;
        }
        match self.client.create_class(&name).await {
          Ok(class) => {
            tracing::info!(class = %class.id, "class created");
            self.admin.class_input = None;
            self.status_msg = format!("Classe {} créée.", class.name);
            self.reload_admin().await;
          }
          Err(e) => self.fail(e),
        }
      }
      _ => {}
    }
  }

  async fn handle_adjust_key(&mut self, key: KeyEvent) {
    let Some(adjust) = self.admin.adjust.as_mut() else {
      return;
    };
    match key.code {
      KeyCode::Esc => self.admin.adjust = None,
      KeyCode::Backspace => {
        adjust.input.pop();
      }
      KeyCode::Char(c) if c.is_ascii_digit() || (c == '-' && adjust.input.is_empty()) => {
        adjust.input.push(c);
      }
      KeyCode::Enter => {
        let Ok(new_total) = adjust.input.trim().parse::<i64>() else {
          self.status_msg = "Valeur invalide.".to_owned();
          return;
        };
        let id = adjust.user_id.clone();
        match self.client.adjust(&id, new_total).await {
          Ok(report) => {
            self.status_msg = if report.event.is_some() {
              format!("Score ajusté de {} à {}.", report.previous, report.current)
            } else {
              "Score inchangé.".to_owned()
            };
            self.admin.adjust = None;
            self.reload_admin().await;
          }
          Err(e) => self.fail(e),
        }
      }
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use evalecole_core::seed::demo;

  use super::*;

  fn classes() -> Vec<ClassGroup> { demo().classes }

  #[test]
  fn form_fields_follow_the_role() {
    let classes = classes();
    let student = UserForm::create(Role::Student, &classes);
    assert_eq!(student.fields(), vec![
      FormField::FullName,
      FormField::Username,
      FormField::Password,
      FormField::Role,
      FormField::Active,
      FormField::Class,
    ]);
    assert_eq!(student.draft.class_id.as_deref(), Some(classes[0].id.as_str()));

    let teacher = UserForm::create(Role::Teacher, &classes);
    assert_eq!(teacher.fields(), vec![
      FormField::FullName,
      FormField::Role,
      FormField::Active,
      FormField::Assigned,
    ]);
    assert_eq!(teacher.draft.class_id, None);
  }

  #[test]
  fn cycling_the_role_keeps_the_cursor_on_it() {
    let classes = classes();
    let mut form = UserForm::create(Role::Student, &classes);
    form.field = 3;
    assert_eq!(form.current(), FormField::Role);

    form.cycle(true, &classes);
    assert_eq!(form.draft.role, Role::Teacher);
    assert_eq!(form.current(), FormField::Role);
    form.cycle(false, &classes);
    form.cycle(false, &classes);
    assert_eq!(form.draft.role, Role::Admin);
  }

  #[test]
  fn typing_goes_to_text_fields_and_space_toggles() {
    let classes = classes();
    let mut form = UserForm::create(Role::Teacher, &classes);
    for c in "M. Petit".chars() {
      form.type_char(c, &classes);
    }
    form.backspace();
    assert_eq!(form.draft.full_name, "M. Peti");

    form.field = 2;
    form.type_char(' ', &classes);
    assert!(!form.draft.active);

    form.field = 3;
    form.cycle(true, &classes);
    form.type_char(' ', &classes);
    assert_eq!(form.draft.assigned_class_ids, vec![classes[1].id.clone()]);
    form.toggle(&classes);
    assert!(form.draft.assigned_class_ids.is_empty());
  }

  #[test]
  fn editing_prefills_from_the_record() {
    let seed = demo();
    let lucas = seed.users.iter().find(|u| u.id == "u_eleve1").unwrap();
    let form = UserForm::edit(lucas, &seed.classes);
    assert_eq!(form.user_id.as_deref(), Some("u_eleve1"));
    assert_eq!(form.draft.username, lucas.username);
    assert_eq!(seed.classes[form.class_cursor].id, lucas.class_id.clone().unwrap());
  }

  #[test]
  fn rosters_split_students_staff_and_scored_adults() {
    let seed = demo();
    let now = chrono::Utc::now();
    let admin = AdminState {
      events: vec![
        PointEvent::custom("u_eleve1", "u_prof1", "x", 4, now),
        PointEvent::custom("u_eleve1", "u_prof1", "y", -1, now),
      ],
      users: seed.users,
      classes: seed.classes,
      ..AdminState::default()
    };
    assert!(admin.students().iter().all(|u| u.role == Role::Student));
    assert!(admin.staff().iter().all(|u| u.role != Role::Admin));
    let scores = admin.scores();
    assert!(scores.iter().all(|(u, _)| u.role.is_adult()));
    assert!(scores.contains(&(admin.users.iter().find(|u| u.id == "u_prof1").unwrap(), 3)));
  }

  #[test]
  fn admin_tabs_wrap() {
    assert_eq!(AdminTab::Students.shift(false), AdminTab::Points);
    assert_eq!(AdminTab::Points.shift(true), AdminTab::Students);
  }
}
