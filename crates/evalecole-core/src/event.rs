//! Point events: the append-only fact log.
//!
//! An event is never updated once written. Score corrections are new
//! compensating events (see [`crate::adjustment`]); resets delete events in
//! bulk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, catalog::ActionDefinition};

/// What was evaluated: either a catalog entry or a free-text label.
///
/// The storage layer keeps these as two nullable columns; exactly one of them
/// is populated, which this type makes unrepresentable otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventAction {
  Catalog { action_id: String },
  Custom { label: String },
}

impl EventAction {
  pub fn action_id(&self) -> Option<&str> {
    match self {
      Self::Catalog { action_id } => Some(action_id),
      Self::Custom { .. } => None,
    }
  }

  pub fn custom_label(&self) -> Option<&str> {
    match self {
      Self::Catalog { .. } => None,
      Self::Custom { label } => Some(label),
    }
  }

  /// Rebuild from the `(action_id, custom_label)` column pair. Empty strings
  /// count as absent.
  pub fn from_parts(
    action_id: Option<String>,
    custom_label: Option<String>,
  ) -> Result<Self> {
    let action_id = action_id.filter(|s| !s.is_empty());
    let custom_label = custom_label.filter(|s| !s.is_empty());
    match (action_id, custom_label) {
      (Some(action_id), None) => Ok(Self::Catalog { action_id }),
      (None, Some(label)) => Ok(Self::Custom { label }),
      (Some(id), Some(_)) => Err(Error::InvalidRecord(format!(
        "event carries both action {id:?} and a custom label"
      ))),
      (None, None) => Err(Error::InvalidRecord(
        "event carries neither an action nor a custom label".into(),
      )),
    }
  }
}

/// One evaluation of an adult.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointEvent {
  pub id:             String,
  /// Creation time.
  pub date_time:      DateTime<Utc>,
  /// The actor who logged it; `"admin_adjust"` for administrative
  /// adjustments.
  pub created_by_id:  String,
  /// Set when the actor is a student.
  pub student_id:     Option<String>,
  /// The adult receiving the points.
  pub target_user_id: String,
  pub action:         EventAction,
  /// Authoritative at write time; never recomputed from the catalog.
  pub points:         i32,
}

impl PointEvent {
  /// An event for a catalog action. The definition's default points are
  /// copied into the event.
  pub fn from_catalog(
    created_by_id: impl Into<String>,
    target_user_id: impl Into<String>,
    action: &ActionDefinition,
    date_time: DateTime<Utc>,
  ) -> Self {
    Self {
      id: crate::new_id(),
      date_time,
      created_by_id: created_by_id.into(),
      student_id: None,
      target_user_id: target_user_id.into(),
      action: EventAction::Catalog { action_id: action.id.to_owned() },
      points: action.default_points,
    }
  }

  /// A free-text event with explicit points.
  pub fn custom(
    created_by_id: impl Into<String>,
    target_user_id: impl Into<String>,
    label: impl Into<String>,
    points: i32,
    date_time: DateTime<Utc>,
  ) -> Self {
    Self {
      id: crate::new_id(),
      date_time,
      created_by_id: created_by_id.into(),
      student_id: None,
      target_user_id: target_user_id.into(),
      action: EventAction::Custom { label: label.into() },
      points,
    }
  }

  /// Record the originating student.
  pub fn with_student(mut self, student_id: impl Into<String>) -> Self {
    self.student_id = Some(student_id.into());
    self
  }

  /// Whether `points` is a reward (zero counts as positive).
  pub fn is_positive(&self) -> bool { self.points >= 0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_parts_requires_exactly_one_side() {
    assert_eq!(
      EventAction::from_parts(Some("p_help".into()), None).unwrap(),
      EventAction::Catalog { action_id: "p_help".into() },
    );
    assert_eq!(
      EventAction::from_parts(None, Some("Aide".into())).unwrap(),
      EventAction::Custom { label: "Aide".into() },
    );
    assert!(EventAction::from_parts(Some("p_help".into()), Some("Aide".into())).is_err());
    assert!(EventAction::from_parts(None, None).is_err());
    assert!(EventAction::from_parts(Some(String::new()), Some(String::new())).is_err());
  }

  #[test]
  fn empty_label_counts_as_absent() {
    assert_eq!(
      EventAction::from_parts(Some("p_late".into()), Some(String::new())).unwrap(),
      EventAction::Catalog { action_id: "p_late".into() },
    );
  }

  #[test]
  fn json_shape_is_tagged() {
    let action = EventAction::Custom { label: "Aide".into() };
    let json = serde_json::to_value(&action).unwrap();
    assert_eq!(json, serde_json::json!({ "kind": "custom", "label": "Aide" }));
  }
}
