//! Roles and the target-role tags used by the action catalog.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The role a user holds in the school.
///
/// The `Display` / `FromStr` form is the label persisted by the storage
/// backends; the serde form is used on the JSON API.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  #[strum(to_string = "Élève")]
  Student,
  #[strum(to_string = "Professeur")]
  Teacher,
  #[strum(to_string = "Surveillant")]
  Supervisor,
  #[strum(to_string = "Direction")]
  Direction,
  #[strum(to_string = "Comptabilité")]
  Accounting,
  #[strum(to_string = "Admin")]
  Admin,
}

impl Role {
  /// Adults are the only users that can receive point events.
  pub fn is_adult(self) -> bool {
    matches!(self, Self::Teacher | Self::Supervisor | Self::Direction)
  }

  /// Staff members have no login of their own.
  pub fn is_staff(self) -> bool { self.is_adult() || self == Self::Accounting }

  /// Staff credentials are never stored; only students and the
  /// administrator log in.
  pub fn has_credentials(self) -> bool { !self.is_staff() }

  /// The catalog tag matching this role, if the role can be evaluated.
  pub fn target_role(self) -> Option<TargetRole> {
    match self {
      Self::Teacher => Some(TargetRole::Teacher),
      Self::Supervisor => Some(TargetRole::Supervisor),
      Self::Direction => Some(TargetRole::Direction),
      Self::Student | Self::Accounting | Self::Admin => None,
    }
  }
}

/// Which adults an [`ActionDefinition`](crate::catalog::ActionDefinition) may
/// be applied to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TargetRole {
  Teacher,
  Supervisor,
  Direction,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn storage_labels_round_trip() {
    for role in Role::iter() {
      let label = role.to_string();
      assert_eq!(Role::from_str(&label).unwrap(), role, "label {label:?}");
    }
    assert_eq!(Role::Student.to_string(), "Élève");
    assert_eq!(Role::Accounting.to_string(), "Comptabilité");
  }

  #[test]
  fn unknown_label_is_rejected() {
    assert!(Role::from_str("Concierge").is_err());
  }

  #[test]
  fn only_adults_have_target_roles() {
    let adults: Vec<Role> =
      Role::iter().filter(|r| r.target_role().is_some()).collect();
    assert_eq!(adults, vec![Role::Teacher, Role::Supervisor, Role::Direction]);
    assert!(adults.iter().all(|r| r.is_adult()));
  }

  #[test]
  fn credentials_follow_staff_split() {
    assert!(Role::Student.has_credentials());
    assert!(Role::Admin.has_credentials());
    assert!(!Role::Accounting.has_credentials());
    assert!(!Role::Teacher.has_credentials());
  }
}
