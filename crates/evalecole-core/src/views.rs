//! Owned, serializable models of what each screen shows.
//!
//! The rule engine works on borrowed slices; these types are what crosses
//! the wire between the API and its clients. They never carry other users'
//! credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  catalog::{ActionCatalog, ActionDefinition, ActionType, CUSTOM_ACTION_ID},
  event::{EventAction, PointEvent},
  navigation::Route,
  role::Role,
  scoring::{
    self, CHART_LIMIT, DashboardStats, HIGHLIGHTS_LIMIT, RankedEntry, Rankings, WeekWindow,
  },
  session::Session,
  store::StoreStatus,
  submission::CustomPoints,
  user::{ClassGroup, User, class_label},
  visibility::Roster,
};

// ─── People ──────────────────────────────────────────────────────────────────

/// A user as seen by other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub id:        String,
  pub full_name: String,
  pub role:      Role,
  pub active:    bool,
}

impl From<&User> for Member {
  fn from(u: &User) -> Self {
    Self { id: u.id.clone(), full_name: u.full_name.clone(), role: u.role, active: u.active }
  }
}

/// The caller's own identity and menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Me {
  /// Password blanked.
  pub user:       User,
  pub menu:       Vec<Route>,
  /// Resolved name of the student's class.
  pub class_name: Option<String>,
}

impl Me {
  pub fn new(session: &Session, classes: &[ClassGroup]) -> Self {
    let mut user = session.user().clone();
    user.password.clear();
    let class_name = (user.role == Role::Student)
      .then(|| class_label(user.class_id.as_deref(), classes).to_owned());
    Self { menu: session.menu(), user, class_name }
  }
}

/// Answer of the status probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
  pub status:       StoreStatus,
  /// Present while the store needs provisioning.
  pub setup_script: Option<String>,
}

// ─── Dashboard and class ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardView {
  pub greeting:    String,
  pub window:      WeekWindow,
  pub stats:       DashboardStats,
  /// Shortcuts offered below the figures.
  pub quick_links: Vec<Route>,
}

impl DashboardView {
  pub fn build(
    session: &Session,
    users: &[User],
    events: &[PointEvent],
    window: WeekWindow,
  ) -> Self {
    let quick_links = [Route::AddPoints, Route::Rankings]
      .into_iter()
      .filter(|r| r.permits(session.role()))
      .collect();
    Self {
      greeting: format!("Bonjour, {}", session.user().full_name),
      stats: scoring::dashboard(session.user(), users, events, &window),
      window,
      quick_links,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterView {
  pub title:    String,
  pub students: Vec<Member>,
  pub teachers: Vec<Member>,
}

impl From<Roster<'_>> for RosterView {
  fn from(r: Roster<'_>) -> Self {
    Self {
      title:    r.title,
      students: r.students.into_iter().map(Member::from).collect(),
      teachers: r.teachers.into_iter().map(Member::from).collect(),
    }
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// One selectable action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOption {
  pub id:     String,
  pub label:  String,
  pub kind:   ActionType,
  pub points: i32,
}

impl From<&ActionDefinition> for ActionOption {
  fn from(a: &ActionDefinition) -> Self {
    Self {
      id:     a.id.to_owned(),
      label:  a.label.to_owned(),
      kind:   a.kind,
      points: a.default_points,
    }
  }
}

/// The action step of the submission flow for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetActions {
  pub target:           Member,
  /// Catalog entries, in declaration order.
  pub actions:          Vec<ActionOption>,
  /// Id of the free-text choice appended after the catalog entries.
  pub custom_action_id: String,
  pub custom_points:    Vec<CustomPoints>,
}

impl TargetActions {
  pub fn new(target: &User, actions: Vec<&ActionDefinition>) -> Self {
    Self {
      target:           target.into(),
      actions:          actions.into_iter().map(ActionOption::from).collect(),
      custom_action_id: CUSTOM_ACTION_ID.to_owned(),
      custom_points:    CustomPoints::ALL.to_vec(),
    }
  }
}

// ─── Rankings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRow {
  /// 1-based position in its list.
  pub rank:  usize,
  pub user:  Member,
  pub score: i64,
}

fn rows(entries: &[RankedEntry<'_>]) -> Vec<RankRow> {
  entries
    .iter()
    .enumerate()
    .map(|(i, e)| RankRow { rank: i + 1, user: e.user.into(), score: e.score })
    .collect()
}

/// The weekly rankings board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingsBoard {
  pub window:      WeekWindow,
  /// Global top, for the chart.
  pub top:         Vec<RankRow>,
  pub teachers:    Vec<RankRow>,
  pub supervisors: Vec<RankRow>,
  pub direction:   Vec<RankRow>,
  pub all:         Vec<RankRow>,
}

impl RankingsBoard {
  pub fn build(users: &[User], events: &[PointEvent], window: WeekWindow) -> Self {
    let r = Rankings::compute(users, events, window);
    Self {
      window,
      top: rows(r.top(CHART_LIMIT)),
      teachers: rows(&r.teachers),
      supervisors: rows(&r.supervisors),
      direction: rows(&r.direction),
      all: rows(&r.all),
    }
  }
}

/// One event in a drill-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRow {
  pub date_time: DateTime<Utc>,
  pub label:     String,
  pub points:    i32,
}

/// Display label of an event: the catalog label, the custom label, or the raw
/// action id when it is no longer in the catalog.
pub fn event_label<'a, C: ActionCatalog + ?Sized>(event: &'a PointEvent, catalog: &'a C) -> &'a str {
  match &event.action {
    EventAction::Catalog { action_id } => {
      catalog.get(action_id).map(|a| a.label).unwrap_or(action_id.as_str())
    }
    EventAction::Custom { label } => label.as_str(),
  }
}

/// An adult's best and worst events over their whole history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillDown {
  pub user:           Member,
  pub weekly_score:   i64,
  pub lifetime_score: i64,
  pub positives:      Vec<HighlightRow>,
  pub negatives:      Vec<HighlightRow>,
}

impl DrillDown {
  pub fn build<C: ActionCatalog + ?Sized>(
    user: &User,
    events: &[PointEvent],
    window: &WeekWindow,
    catalog: &C,
  ) -> Self {
    let h = scoring::highlights(&user.id, events, HIGHLIGHTS_LIMIT);
    let row = |e: &PointEvent| HighlightRow {
      date_time: e.date_time,
      label:     event_label(e, catalog).to_owned(),
      points:    e.points,
    };
    Self {
      user:           user.into(),
      weekly_score:   scoring::weekly_score(&user.id, events, window),
      lifetime_score: scoring::lifetime_score(&user.id, events),
      positives:      h.positives.into_iter().map(&row).collect(),
      negatives:      h.negatives.into_iter().map(&row).collect(),
    }
  }
}

// ─── Administration ──────────────────────────────────────────────────────────

/// The user form: everything but the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
  pub full_name:          String,
  #[serde(default)]
  pub username:           String,
  #[serde(default)]
  pub password:           String,
  pub role:               Role,
  #[serde(default = "default_active")]
  pub active:             bool,
  #[serde(default)]
  pub class_id:           Option<String>,
  #[serde(default)]
  pub assigned_class_ids: Vec<String>,
}

fn default_active() -> bool { true }

impl UserDraft {
  /// Prefill the form from an existing record.
  pub fn from_user(user: &User) -> Self {
    Self {
      full_name:          user.full_name.clone(),
      username:           user.username.clone(),
      password:           user.password.clone(),
      role:               user.role,
      active:             user.active,
      class_id:           user.class_id.clone(),
      assigned_class_ids: user.assigned_class_ids.clone(),
    }
  }

  /// Build the record to persist under `id`, with the per-role field rules
  /// applied. The name is required.
  pub fn into_user(self, id: impl Into<String>) -> Result<User> {
    let full_name = self.full_name.trim();
    if full_name.is_empty() {
      return Err(Error::InvalidRecord("full name is required".into()));
    }
    let user = User {
      id:                 id.into(),
      full_name:          full_name.to_owned(),
      username:           self.username.trim().to_owned(),
      password:           self.password,
      role:               self.role,
      active:             self.active,
      class_id:           self.class_id.filter(|c| !c.is_empty()),
      assigned_class_ids: self.assigned_class_ids,
    };
    Ok(user.normalized())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDraft {
  pub name: String,
}

/// Body of a score adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustRequest {
  pub new_total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
  pub user_id:        String,
  pub lifetime_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentReport {
  pub previous: i64,
  pub current:  i64,
  /// The compensating event, if one was needed.
  pub event:    Option<PointEvent>,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::{catalog::StaticCatalog, seed::demo, session::authenticate};

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 10, 14, 10, 0, 0).unwrap() }

  #[test]
  fn me_hides_the_password_and_resolves_the_class() {
    let seed = demo();
    let session = authenticate(&seed.users, "eleve1", "123").unwrap();
    let me = Me::new(&session, &seed.classes);
    assert!(me.user.password.is_empty());
    assert_eq!(me.class_name.as_deref(), Some("6ème A"));
    assert_eq!(me.menu, crate::navigation::menu(Role::Student));

    let me = Me::new(&session, &[]);
    assert_eq!(me.class_name.as_deref(), Some("Non assigné"));
  }

  #[test]
  fn board_ranks_from_one() {
    let seed = demo();
    let events = vec![PointEvent::custom("u_eleve1", "u_prof2", "x", 4, now())];
    let board = RankingsBoard::build(&seed.users, &events, WeekWindow::containing(&now()));
    assert_eq!(board.all.len(), 4);
    assert_eq!(board.top.len(), 4);
    assert_eq!(board.all[0].rank, 1);
    assert_eq!(board.all[0].user.id, "u_prof2");
    assert_eq!(board.teachers[1].user.id, "u_prof1");
  }

  #[test]
  fn drill_down_labels_events() {
    let seed = demo();
    let teacher = &seed.users[1];
    let help = StaticCatalog.get("p_help").unwrap();
    let events = vec![
      PointEvent::from_catalog("u_eleve1", &teacher.id, help, now()),
      PointEvent::custom("u_eleve1", &teacher.id, "Retard", -2, now()),
      PointEvent {
        action: EventAction::Catalog { action_id: "retired".into() },
        ..PointEvent::custom("u_eleve1", &teacher.id, "", 1, now())
      },
    ];
    let d = DrillDown::build(teacher, &events, &WeekWindow::containing(&now()), &StaticCatalog);
    let labels: Vec<&str> = d.positives.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, ["M'a aidé", "retired"]);
    assert_eq!(d.negatives[0].label, "Retard");
    assert_eq!(d.lifetime_score, 4);
    assert_eq!(d.weekly_score, 4);
  }

  #[test]
  fn target_actions_append_custom_choice() {
    let seed = demo();
    let target = &seed.users[3];
    let view = TargetActions::new(target, StaticCatalog.for_target(crate::role::TargetRole::Supervisor));
    assert_eq!(view.actions.len(), 7);
    assert_eq!(view.custom_action_id, CUSTOM_ACTION_ID);
    assert_eq!(view.custom_points.len(), 10);
  }

  #[test]
  fn draft_requires_a_name_and_normalizes() {
    let draft = UserDraft {
      full_name:          "  Mme Martin ".into(),
      username:           "martin".into(),
      password:           "x".into(),
      role:               Role::Supervisor,
      active:             true,
      class_id:           Some("c1".into()),
      assigned_class_ids: vec!["c1".into()],
    };
    let user = draft.clone().into_user("sv9").unwrap();
    assert_eq!(user.full_name, "Mme Martin");
    assert!(user.username.is_empty() && user.password.is_empty());
    assert_eq!(user.class_id, None);
    assert!(user.assigned_class_ids.is_empty());

    let blank = UserDraft { full_name: "   ".into(), ..draft };
    assert!(blank.into_user("x").is_err());
  }

  #[test]
  fn draft_defaults_to_active() {
    let draft: UserDraft =
      serde_json::from_str(r#"{"full_name":"Léa","role":"student"}"#).unwrap();
    assert!(draft.active);
    assert_eq!(draft.class_id, None);
  }

  #[test]
  fn dashboard_quick_links_follow_permissions() {
    let seed = demo();
    let session = authenticate(&seed.users, "Paul", "Paul2025.").unwrap();
    let view = DashboardView::build(&session, &seed.users, &[], WeekWindow::containing(&now()));
    assert_eq!(view.greeting, "Bonjour, Administrateur");
    assert_eq!(view.quick_links, [Route::AddPoints, Route::Rankings]);
    assert_eq!(view.stats.actions_given_this_week, Some(0));
  }
}
