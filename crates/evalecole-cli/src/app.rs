//! Application state machine and event dispatcher.

mod admin;
mod points;

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use evalecole_core::{
  navigation::Route,
  session::{Session, restore},
  store::StoreStatus,
  views::{DashboardView, DrillDown, RankRow, RankingsBoard, RosterView},
};
use reqwest::StatusCode;

pub use admin::{AdjustForm, AdminState, AdminTab, FormField, UserForm};
pub use points::PointsState;

use crate::{
  client::{ApiClient, Credentials, ServerError},
  state::{SavedSession, StateFile},
};

/// Shown for any refused login.
const LOGIN_FAILED: &str = "Identifiant ou mot de passe incorrect";

// ─── Screen ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// The store has no schema yet; shows the setup script.
  Setup,
  Login,
  /// Logged in; the active [`Route`] decides the body.
  Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
  #[default]
  Username,
  Password,
}

#[derive(Debug, Default)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
  pub field:    LoginField,
  /// Inline message under the form.
  pub error:    Option<String>,
}

// ─── Rankings ────────────────────────────────────────────────────────────────

/// Which leaderboard the rankings screen lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankTab {
  #[default]
  All,
  Teachers,
  Supervisors,
  Direction,
}

impl RankTab {
  pub const ALL: [RankTab; 4] =
    [RankTab::All, RankTab::Teachers, RankTab::Supervisors, RankTab::Direction];

  pub fn title(self) -> &'static str {
    match self {
      RankTab::All => "Général",
      RankTab::Teachers => "Professeurs",
      RankTab::Supervisors => "Surveillants",
      RankTab::Direction => "Direction",
    }
  }

  pub fn rows(self, board: &RankingsBoard) -> &[RankRow] {
    match self {
      RankTab::All => &board.all,
      RankTab::Teachers => &board.teachers,
      RankTab::Supervisors => &board.supervisors,
      RankTab::Direction => &board.direction,
    }
  }

  fn shift(self, forward: bool) -> Self {
    let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
    let n = Self::ALL.len();
    Self::ALL[if forward { (i + 1) % n } else { (i + n - 1) % n }]
  }
}

#[derive(Debug, Default)]
pub struct RankingsState {
  pub board:  Option<RankingsBoard>,
  pub tab:    RankTab,
  pub cursor: usize,
  /// Open highlights for the selected adult.
  pub drill:  Option<DrillDown>,
}

impl RankingsState {
  pub fn rows(&self) -> &[RankRow] {
    self.board.as_ref().map(|b| self.tab.rows(b)).unwrap_or_default()
  }
}

// ─── App ─────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen:       Screen,
  pub setup_script: String,
  pub setup_scroll: u16,
  pub login:        LoginForm,

  /// `Some` exactly while on [`Screen::Main`].
  pub session:    Option<Session>,
  pub class_name: Option<String>,
  pub menu:       Vec<Route>,
  pub route:      Route,

  pub dashboard: Option<DashboardView>,
  pub roster:    Option<RosterView>,
  pub points:    PointsState,
  pub rankings:  RankingsState,
  pub admin:     AdminState,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  pub client: ApiClient,
  state_file: Option<StateFile>,
}

impl App {
  pub fn new(client: ApiClient, state_file: Option<StateFile>) -> Self {
    Self {
      screen: Screen::Login,
      setup_script: String::new(),
      setup_scroll: 0,
      login: LoginForm::default(),
      session: None,
      class_name: None,
      menu: Vec::new(),
      route: Route::Dashboard,
      dashboard: None,
      roster: None,
      points: PointsState::default(),
      rankings: RankingsState::default(),
      admin: AdminState::default(),
      status_msg: String::new(),
      client,
      state_file,
    }
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// Check the store, then try the persisted session.
  pub async fn boot(&mut self) {
    match self.client.status().await {
      Ok(report) if report.status == StoreStatus::NeedsProvisioning => {
        self.show_setup(report.setup_script.unwrap_or_default());
        return;
      }
      Ok(_) => self.screen = Screen::Login,
      Err(e) => {
        self.status_msg = format!("Serveur injoignable : {e}");
        return;
      }
    }

    let Some(saved) = self.state_file.as_ref().and_then(StateFile::load_session) else {
      return;
    };
    self.client.set_credentials(Some(Credentials {
      username: saved.username.clone(),
      password: saved.password.clone(),
    }));

    let me = match self.client.me().await {
      Ok(me) => Some(me),
      Err(e) if ServerError::status_of(&e) == Some(StatusCode::UNAUTHORIZED) => None,
      Err(e) => {
        self.client.set_credentials(None);
        self.fail(e);
        return;
      }
    };
    let class_name = me.as_ref().and_then(|m| m.class_name.clone());

    match restore(&saved.session, me.map(|m| m.user)) {
      Some(session) => self.enter(session, class_name, saved.username, saved.password).await,
      None => {
        tracing::info!("stored session is no longer valid");
        self.client.set_credentials(None);
        self.forget_session();
      }
    }
  }

  async fn submit_login(&mut self) {
    let username = self.login.username.trim().to_owned();
    let password = self.login.password.clone();
    if username.is_empty() || password.is_empty() {
      self.login.error = Some(LOGIN_FAILED.into());
      return;
    }

    self.client.set_credentials(Some(Credentials {
      username: username.clone(),
      password: password.clone(),
    }));
    match self.client.me().await {
      Ok(me) => match Session::verified(me.user) {
        Some(session) => self.enter(session, me.class_name, username, password).await,
        None => self.refuse_login(),
      },
      Err(e) if ServerError::status_of(&e) == Some(StatusCode::UNAUTHORIZED) => self.refuse_login(),
      Err(e) => {
        self.client.set_credentials(None);
        self.fail(e);
      }
    }
  }

  fn refuse_login(&mut self) {
    tracing::info!(username = %self.login.username, "login refused");
    self.client.set_credentials(None);
    self.login.password.clear();
    self.login.error = Some(LOGIN_FAILED.into());
  }

  async fn enter(
    &mut self,
    session: Session,
    class_name: Option<String>,
    username: String,
    password: String,
  ) {
    if let Some(file) = &self.state_file {
      let saved = SavedSession { username, password, session: session.clone() };
      if let Err(e) = file.save_session(&saved) {
        tracing::warn!(error = %e, "could not persist session");
      }
    }
    tracing::info!(user = %session.user().id, role = %session.role(), "logged in");

    self.menu = session.menu();
    self.session = Some(session);
    self.class_name = class_name;
    self.login = LoginForm::default();
    self.screen = Screen::Main;
    self.navigate(Route::Dashboard).await;
  }

  pub fn logout(&mut self) {
    self.client.set_credentials(None);
    self.forget_session();
    self.session = None;
    self.class_name = None;
    self.menu.clear();
    self.route = Route::Dashboard;
    self.dashboard = None;
    self.roster = None;
    self.points = PointsState::default();
    self.rankings = RankingsState::default();
    self.admin = AdminState::default();
    self.screen = Screen::Login;
  }

  fn forget_session(&self) {
    let Some(file) = &self.state_file else {
      return;
    };
    if let Err(e) = file.clear_session() {
      tracing::warn!(error = %e, "could not clear stored session");
    }
  }

  fn show_setup(&mut self, script: String) {
    self.setup_script = script;
    self.setup_scroll = 0;
    self.screen = Screen::Setup;
  }

  /// Route a failed request: an expired session goes back to the login, an
  /// unprovisioned store to the setup screen, anything else to the status
  /// bar. Nothing is retried.
  fn fail(&mut self, err: anyhow::Error) {
    match err.downcast_ref::<ServerError>() {
      Some(e) if e.status == StatusCode::SERVICE_UNAVAILABLE => {
        self.show_setup(e.setup_script.clone().unwrap_or_default());
      }
      Some(e) if e.status == StatusCode::UNAUTHORIZED && self.session.is_some() => {
        self.logout();
        self.login.error = Some("Session expirée, veuillez vous reconnecter".into());
      }
      _ => {
        tracing::warn!(error = %err, "request failed");
        self.status_msg = format!("Erreur : {err}");
      }
    }
  }

  // ── Navigation ────────────────────────────────────────────────────────────

  /// Open `requested`, or the dashboard if the role may not.
  pub async fn navigate(&mut self, requested: Route) {
    let Some(session) = &self.session else {
      return;
    };
    self.route = session.navigate(requested);
    self.status_msg.clear();
    self.reload().await;
  }

  /// Refetch everything the current route shows.
  pub async fn reload(&mut self) {
    let result = match self.route {
      Route::Dashboard => match self.client.dashboard().await {
        Ok(view) => {
          self.dashboard = Some(view);
          Ok(())
        }
        Err(e) => Err(e),
      },
      Route::MyClass => match self.client.my_class().await {
        Ok(view) => {
          self.roster = Some(view);
          Ok(())
        }
        Err(e) => Err(e),
      },
      Route::AddPoints => {
        self.points = PointsState::default();
        self.load_targets().await
      }
      Route::Rankings => match self.client.rankings().await {
        Ok(board) => {
          self.rankings.board = Some(board);
          self.rankings.drill = None;
          self.rankings.cursor = 0;
          Ok(())
        }
        Err(e) => Err(e),
      },
      Route::UserManagement => self.admin.reload(&self.client).await,
    };
    if let Err(e) = result {
      self.fail(e);
    }
  }

  fn shift_route(&self, forward: bool) -> Option<Route> {
    let n = self.menu.len();
    if n == 0 {
      return None;
    }
    let i = self.menu.iter().position(|r| *r == self.route).unwrap_or(0);
    Some(self.menu[if forward { (i + 1) % n } else { (i + n - 1) % n }])
  }

  /// Whether keys currently go into a text field.
  pub fn is_typing(&self) -> bool {
    match self.route {
      Route::AddPoints => self.points.is_typing(),
      Route::UserManagement => self.admin.is_typing(),
      _ => false,
    }
  }

  /// Time-driven transitions; called on every loop iteration.
  pub async fn tick(&mut self) {
    if self.points.confirmation_elapsed(Instant::now()) {
      self.points = PointsState::default();
      self.navigate(Route::Dashboard).await;
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    match self.screen {
      Screen::Setup => self.handle_setup_key(key).await,
      Screen::Login => self.handle_login_key(key).await,
      Screen::Main => self.handle_main_key(key).await,
    }
  }

  async fn handle_setup_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
      KeyCode::Down | KeyCode::Char('j') => self.setup_scroll = self.setup_scroll.saturating_add(1),
      KeyCode::Up | KeyCode::Char('k') => self.setup_scroll = self.setup_scroll.saturating_sub(1),
      KeyCode::Char('r') => self.boot().await,
      _ => {}
    }
    Ok(true)
  }

  async fn handle_login_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let field = self.login.field;
    match key.code {
      KeyCode::Esc => return Ok(false),
      KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
        self.login.field = match field {
          LoginField::Username => LoginField::Password,
          LoginField::Password => LoginField::Username,
        };
      }
      KeyCode::Enter => match field {
        LoginField::Username => self.login.field = LoginField::Password,
        LoginField::Password => self.submit_login().await,
      },
      KeyCode::Backspace => {
        match field {
          LoginField::Username => self.login.username.pop(),
          LoginField::Password => self.login.password.pop(),
        };
      }
      KeyCode::Char(c) => match field {
        LoginField::Username => self.login.username.push(c),
        LoginField::Password => self.login.password.push(c),
      },
      _ => {}
    }
    Ok(true)
  }

  async fn handle_main_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    let modal = self.is_typing() || self.admin.gate.pending().is_some();
    if !modal {
      match key.code {
        KeyCode::Char('q') => return Ok(false),
        KeyCode::Char('x') => {
          self.logout();
          return Ok(true);
        }
        KeyCode::F(5) => {
          self.reload().await;
          return Ok(true);
        }
        KeyCode::Tab | KeyCode::BackTab => {
          if let Some(route) = self.shift_route(key.code == KeyCode::Tab) {
            self.navigate(route).await;
          }
          return Ok(true);
        }
        KeyCode::Char(c @ '1'..='9') => {
          let index = c as usize - '1' as usize;
          if let Some(&route) = self.menu.get(index) {
            self.navigate(route).await;
          }
          return Ok(true);
        }
        _ => {}
      }
    }

    match self.route {
      Route::Dashboard => match key.code {
        KeyCode::Char('a') => self.navigate(Route::AddPoints).await,
        KeyCode::Char('c') => self.navigate(Route::Rankings).await,
        _ => {}
      },
      Route::MyClass => {}
      Route::AddPoints => self.handle_points_key(key).await,
      Route::Rankings => self.handle_rankings_key(key).await,
      Route::UserManagement => self.handle_admin_key(key).await,
    }
    Ok(true)
  }

  async fn handle_rankings_key(&mut self, key: KeyEvent) {
    if self.rankings.drill.is_some() {
      if matches!(key.code, KeyCode::Esc | KeyCode::Left | KeyCode::Char('h')) {
        self.rankings.drill = None;
      }
      return;
    }

    let len = self.rankings.rows().len();
    match key.code {
      KeyCode::Left | KeyCode::Char('h') | KeyCode::Right | KeyCode::Char('l') => {
        let forward = matches!(key.code, KeyCode::Right | KeyCode::Char('l'));
        self.rankings.tab = self.rankings.tab.shift(forward);
        self.rankings.cursor = 0;
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if self.rankings.cursor + 1 < len {
          self.rankings.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.rankings.cursor = self.rankings.cursor.saturating_sub(1);
      }
      KeyCode::Enter => {
        let Some(id) = self.rankings.rows().get(self.rankings.cursor).map(|r| r.user.id.clone())
        else {
          return;
        };
        match self.client.drill_down(&id).await {
          Ok(drill) => self.rankings.drill = Some(drill),
          Err(e) => self.fail(e),
        }
      }
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use evalecole_core::{
    event::PointEvent, scoring::WeekWindow, seed::demo, session::authenticate,
  };

  use super::*;

  fn app() -> App { App::new(ApiClient::new("http://127.0.0.1:9").unwrap(), None) }

  fn board() -> RankingsBoard {
    let seed = demo();
    let now = Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap();
    let events = vec![PointEvent::custom("u_eleve1", "u_surv1", "x", 3, now)];
    RankingsBoard::build(&seed.users, &events, WeekWindow::containing(&now))
  }

  #[test]
  fn rank_tabs_cycle_both_ways() {
    assert_eq!(RankTab::All.shift(true), RankTab::Teachers);
    assert_eq!(RankTab::All.shift(false), RankTab::Direction);
    assert_eq!(RankTab::Direction.shift(true), RankTab::All);
  }

  #[test]
  fn rank_tabs_pick_their_list() {
    let board = board();
    assert_eq!(RankTab::All.rows(&board)[0].user.id, "u_surv1");
    assert_eq!(RankTab::Teachers.rows(&board).len(), 2);
    assert_eq!(RankTab::Direction.rows(&board)[0].user.id, "u_dir1");
  }

  #[test]
  fn menu_cycles_through_permitted_routes_only() {
    let mut app = app();
    let session = authenticate(&demo().users, "Paul", "Paul2025.").unwrap();
    app.menu = session.menu();
    app.session = Some(session);
    app.route = Route::Rankings;
    assert_eq!(app.shift_route(true), Some(Route::UserManagement));
    app.route = Route::Dashboard;
    assert_eq!(app.shift_route(false), Some(Route::UserManagement));
  }

  #[tokio::test]
  async fn navigation_is_ignored_without_a_session() {
    let mut app = app();
    app.navigate(Route::UserManagement).await;
    assert_eq!(app.route, Route::Dashboard);
  }

  #[tokio::test]
  async fn logout_clears_everything() {
    let mut app = app();
    let session = authenticate(&demo().users, "eleve1", "123").unwrap();
    app.menu = session.menu();
    app.session = Some(session);
    app.screen = Screen::Main;
    app.rankings.board = Some(board());

    app.logout();
    assert_eq!(app.screen, Screen::Login);
    assert!(app.session.is_none() && app.menu.is_empty());
    assert!(app.rankings.board.is_none());
  }
}
