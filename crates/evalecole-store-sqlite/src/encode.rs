//! Mapping between SQLite rows and domain records.
//!
//! Rows are read as loosely-typed `Raw*` structs and validated on the way in:
//! role labels must be known, timestamps must parse, events must carry exactly
//! one of `action_id` / `custom_label`. Missing optional columns fall back to
//! defaults (`active` NULL means active, NULL assignments mean none).

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use evalecole_core::{
  event::{EventAction, PointEvent},
  role::Role,
  user::{ClassGroup, User},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Millis, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> String { role.to_string() }

pub fn decode_role(s: &str) -> Result<Role> {
  Role::from_str(s).map_err(|_| Error::UnknownRole(s.to_owned()))
}

// ─── Class assignments ───────────────────────────────────────────────────────

pub fn encode_class_ids(ids: &[String]) -> Result<Option<String>> {
  if ids.is_empty() {
    Ok(None)
  } else {
    Ok(Some(serde_json::to_string(ids)?))
  }
}

pub fn decode_class_ids(s: Option<&str>) -> Result<Vec<String>> {
  match s.map(str::trim).filter(|s| !s.is_empty()) {
    Some(json) => Ok(serde_json::from_str(json)?),
    None => Ok(Vec::new()),
  }
}

/// Empty text columns read as NULL.
fn non_empty(s: Option<String>) -> Option<String> { s.filter(|s| !s.is_empty()) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "id, full_name, username, password, role, active, class_id, assigned_class_ids";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:                 String,
  pub full_name:          String,
  pub username:           Option<String>,
  pub password:           Option<String>,
  pub role:               String,
  pub active:             Option<bool>,
  pub class_id:           Option<String>,
  pub assigned_class_ids: Option<String>,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      full_name:          row.get(1)?,
      username:           row.get(2)?,
      password:           row.get(3)?,
      role:               row.get(4)?,
      active:             row.get(5)?,
      class_id:           row.get(6)?,
      assigned_class_ids: row.get(7)?,
    })
  }

  /// Decode and drop the fields the role does not use.
  pub fn into_user(self) -> Result<User> {
    let user = User {
      role:               decode_role(&self.role)?,
      assigned_class_ids: decode_class_ids(self.assigned_class_ids.as_deref())?,
      id:                 self.id,
      full_name:          self.full_name,
      username:           self.username.unwrap_or_default(),
      password:           self.password.unwrap_or_default(),
      active:             self.active.unwrap_or(true),
      class_id:           non_empty(self.class_id),
    };
    Ok(user.normalized())
  }
}

/// Column values for an insert or update of `user`, in [`USER_COLUMNS`]
/// order.
pub struct UserParams {
  pub id:                 String,
  pub full_name:          String,
  pub username:           Option<String>,
  pub password:           Option<String>,
  pub role:               String,
  pub active:             bool,
  pub class_id:           Option<String>,
  pub assigned_class_ids: Option<String>,
}

impl UserParams {
  pub fn encode(user: User) -> Result<Self> {
    let user = user.normalized();
    Ok(Self {
      assigned_class_ids: encode_class_ids(&user.assigned_class_ids)?,
      role:               encode_role(user.role),
      username:           non_empty(Some(user.username)),
      password:           non_empty(Some(user.password)),
      id:                 user.id,
      full_name:          user.full_name,
      active:             user.active,
      class_id:           user.class_id,
    })
  }
}

/// Raw values read directly from a `classes` row.
pub struct RawClass {
  pub id:   String,
  pub name: String,
}

impl RawClass {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, name: row.get(1)? })
  }

  pub fn into_class(self) -> ClassGroup { ClassGroup { id: self.id, name: self.name } }
}

pub const EVENT_COLUMNS: &str =
  "id, date_time, created_by_id, student_id, target_user_id, action_id, custom_label, points";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub id:             String,
  pub date_time:      String,
  pub created_by_id:  String,
  pub student_id:     Option<String>,
  pub target_user_id: String,
  pub action_id:      Option<String>,
  pub custom_label:   Option<String>,
  pub points:         i64,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      date_time:      row.get(1)?,
      created_by_id:  row.get(2)?,
      student_id:     row.get(3)?,
      target_user_id: row.get(4)?,
      action_id:      row.get(5)?,
      custom_label:   row.get(6)?,
      points:         row.get(7)?,
    })
  }

  pub fn into_event(self) -> Result<PointEvent> {
    Ok(PointEvent {
      date_time:      decode_dt(&self.date_time)?,
      action:         EventAction::from_parts(self.action_id, self.custom_label)?,
      points:         i32::try_from(self.points)
        .map_err(|_| Error::PointsOutOfRange(self.points))?,
      id:             self.id,
      created_by_id:  self.created_by_id,
      student_id:     non_empty(self.student_id),
      target_user_id: self.target_user_id,
    })
  }
}

/// Column values for inserting `event`, in [`EVENT_COLUMNS`] order.
pub struct EventParams {
  pub id:             String,
  pub date_time:      String,
  pub created_by_id:  String,
  pub student_id:     Option<String>,
  pub target_user_id: String,
  pub action_id:      Option<String>,
  pub custom_label:   Option<String>,
  pub points:         i64,
}

impl EventParams {
  pub fn encode(event: PointEvent) -> Self {
    let (action_id, custom_label) = match event.action {
      EventAction::Catalog { action_id } => (Some(action_id), None),
      EventAction::Custom { label } => (None, Some(label)),
    };
    Self {
      id: event.id,
      date_time: encode_dt(event.date_time),
      created_by_id: event.created_by_id,
      student_id: event.student_id,
      target_user_id: event.target_user_id,
      action_id,
      custom_label,
      points: i64::from(event.points),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw_user(role: &str) -> RawUser {
    RawUser {
      id:                 "u".into(),
      full_name:          "Someone".into(),
      username:           Some("login".into()),
      password:           Some("pw".into()),
      role:               role.into(),
      active:             None,
      class_id:           Some("c1".into()),
      assigned_class_ids: Some("[\"c1\",\"c2\"]".into()),
    }
  }

  #[test]
  fn user_row_defaults_and_role_rules() {
    let teacher = raw_user("Professeur").into_user().unwrap();
    assert!(teacher.active);
    assert_eq!(teacher.assigned_class_ids, ["c1", "c2"]);
    assert_eq!(teacher.class_id, None);
    assert!(teacher.username.is_empty());

    let student = raw_user("Élève").into_user().unwrap();
    assert_eq!(student.class_id.as_deref(), Some("c1"));
    assert!(student.assigned_class_ids.is_empty());
    assert_eq!(student.password, "pw");
  }

  #[test]
  fn unknown_role_is_rejected() {
    assert!(matches!(raw_user("Janitor").into_user(), Err(Error::UnknownRole(r)) if r == "Janitor"));
  }

  #[test]
  fn event_row_needs_exactly_one_action_side() {
    let raw = |action_id: Option<&str>, label: Option<&str>| RawEvent {
      id:             "e".into(),
      date_time:      "2026-10-14T10:00:00.000Z".into(),
      created_by_id:  "s1".into(),
      student_id:     None,
      target_user_id: "t1".into(),
      action_id:      action_id.map(Into::into),
      custom_label:   label.map(Into::into),
      points:         3,
    };
    assert!(raw(Some("p_nice"), None).into_event().is_ok());
    assert!(raw(None, Some("Aide")).into_event().is_ok());
    assert!(matches!(raw(None, None).into_event(), Err(Error::Core(_))));
    assert!(matches!(raw(Some("p_nice"), Some("Aide")).into_event(), Err(Error::Core(_))));
  }

  #[test]
  fn malformed_timestamp_is_rejected() {
    let raw = RawEvent {
      id:             "e".into(),
      date_time:      "yesterday".into(),
      created_by_id:  "s1".into(),
      student_id:     None,
      target_user_id: "t1".into(),
      action_id:      Some("p_nice".into()),
      custom_label:   None,
      points:         3,
    };
    assert!(matches!(raw.into_event(), Err(Error::DateParse(_))));
  }

  #[test]
  fn timestamps_keep_milliseconds() {
    let dt = decode_dt("2026-10-18T23:59:59.999Z").unwrap();
    assert_eq!(encode_dt(dt), "2026-10-18T23:59:59.999Z");
  }
}
