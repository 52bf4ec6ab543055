//! The compiled-in catalog of evaluable actions.

use serde::{Deserialize, Serialize};

use crate::role::TargetRole;

/// Identifier of the synthetic free-text choice offered next to the catalog.
/// It is never part of the catalog itself.
pub const CUSTOM_ACTION_ID: &str = "custom_action";

/// Polarity of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
  Positive,
  Negative,
}

/// An immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
  pub id:             &'static str,
  pub label:          &'static str,
  /// Adults this action may be applied to.
  pub target_roles:   &'static [TargetRole],
  pub kind:           ActionType,
  pub default_points: i32,
}

impl ActionDefinition {
  pub fn applies_to(&self, target: TargetRole) -> bool {
    self.target_roles.contains(&target)
  }
}

const TEACHER: &[TargetRole] = &[TargetRole::Teacher];
const SUPERVISION: &[TargetRole] = &[TargetRole::Supervisor, TargetRole::Direction];

const fn action(
  id: &'static str,
  label: &'static str,
  target_roles: &'static [TargetRole],
  kind: ActionType,
  default_points: i32,
) -> ActionDefinition {
  ActionDefinition { id, label, target_roles, kind, default_points }
}

/// Catalog entries, in declaration order.
pub static ACTIONS: &[ActionDefinition] = &[
  // Teachers
  action("p_help", "M'a aidé", TEACHER, ActionType::Positive, 5),
  action("p_nice", "A été sympa", TEACHER, ActionType::Positive, 3),
  action("p_absent", "N'a pas été là", TEACHER, ActionType::Positive, 10),
  action("p_rude", "M'a envoyé chier", TEACHER, ActionType::Negative, -10),
  action("p_mock", "M'a ridiculisé", TEACHER, ActionType::Negative, -5),
  action("p_late", "Arrivé en retard", TEACHER, ActionType::Negative, -2),
  action(
    "p_homework",
    "A donné des devoirs / évaluations",
    TEACHER,
    ActionType::Negative,
    -3,
  ),
  // Supervisors and direction
  action("sd_help", "M'a aidé", SUPERVISION, ActionType::Positive, 5),
  action("sd_justice", "M'a rendu justice", SUPERVISION, ActionType::Positive, 5),
  action("sd_protect", "M'a protégé", SUPERVISION, ActionType::Positive, 5),
  action("sd_belittle", "M'a rabaissé", SUPERVISION, ActionType::Negative, -5),
  action("sd_ignore", "M'a ignoré", SUPERVISION, ActionType::Negative, -3),
  action("sd_speak_bad", "M'a mal parlé", SUPERVISION, ActionType::Negative, -5),
  action("sd_punish", "Punition injuste", SUPERVISION, ActionType::Negative, -10),
];

/// Read access to a set of action definitions.
pub trait ActionCatalog: Send + Sync {
  /// Every entry, in declaration order.
  fn all(&self) -> &[ActionDefinition];

  fn get(&self, id: &str) -> Option<&ActionDefinition> {
    self.all().iter().find(|a| a.id == id)
  }

  /// Entries applicable to `target`, in declaration order.
  fn for_target(&self, target: TargetRole) -> Vec<&ActionDefinition> {
    self.all().iter().filter(|a| a.applies_to(target)).collect()
  }
}

/// The built-in catalog backed by [`ACTIONS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl ActionCatalog for StaticCatalog {
  fn all(&self) -> &[ActionDefinition] { ACTIONS }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn ids_are_unique_and_never_custom() {
    let ids: HashSet<_> = ACTIONS.iter().map(|a| a.id).collect();
    assert_eq!(ids.len(), ACTIONS.len());
    assert!(!ids.contains(CUSTOM_ACTION_ID));
  }

  #[test]
  fn polarity_matches_sign() {
    for a in ACTIONS {
      match a.kind {
        ActionType::Positive => assert!(a.default_points > 0, "{}", a.id),
        ActionType::Negative => assert!(a.default_points < 0, "{}", a.id),
      }
    }
  }

  #[test]
  fn for_target_keeps_declaration_order() {
    let teacher: Vec<_> =
      StaticCatalog.for_target(TargetRole::Teacher).iter().map(|a| a.id).collect();
    assert_eq!(
      teacher,
      ["p_help", "p_nice", "p_absent", "p_rude", "p_mock", "p_late", "p_homework"],
    );

    let direction = StaticCatalog.for_target(TargetRole::Direction);
    assert_eq!(direction.len(), 7);
    assert!(direction.iter().all(|a| a.id.starts_with("sd_")));
    assert_eq!(direction, StaticCatalog.for_target(TargetRole::Supervisor));
  }

  #[test]
  fn get_finds_by_id() {
    assert_eq!(StaticCatalog.get("sd_punish").map(|a| a.default_points), Some(-10));
    assert!(StaticCatalog.get(CUSTOM_ACTION_ID).is_none());
  }
}
