//! Users and class groups.
//!
//! Both are plain identity records. Dangling references between them (a
//! student whose class was deleted, a teacher assigned to a class that does
//! not exist yet) are legal states; lookups resolve them to a display
//! fallback instead of failing.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Label shown for a class reference that no longer resolves.
pub const UNASSIGNED_LABEL: &str = "Non assigné";

/// Label shown for a user reference that no longer resolves.
pub const UNKNOWN_LABEL: &str = "Inconnu";

/// A named grouping of students, e.g. "6ème A".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassGroup {
  pub id:   String,
  pub name: String,
}

/// An identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:                 String,
  pub full_name:          String,
  /// Login name; empty for roles that never authenticate.
  #[serde(default)]
  pub username:           String,
  /// Stored and compared in plaintext.
  #[serde(default)]
  pub password:           String,
  pub role:               Role,
  /// Inactive users stay in storage but cannot log in, are never offered as
  /// evaluation targets and are left out of rankings.
  pub active:             bool,
  /// The student's class. Only meaningful for [`Role::Student`].
  #[serde(default)]
  pub class_id:           Option<String>,
  /// Classes a teacher is visible to. Only meaningful for [`Role::Teacher`].
  #[serde(default)]
  pub assigned_class_ids: Vec<String>,
}

impl User {
  /// A fresh active user with no credentials or class links.
  pub fn new(id: impl Into<String>, full_name: impl Into<String>, role: Role) -> Self {
    Self {
      id: id.into(),
      full_name: full_name.into(),
      username: String::new(),
      password: String::new(),
      role,
      active: true,
      class_id: None,
      assigned_class_ids: Vec::new(),
    }
  }

  /// Apply the per-role field rules before persisting: only students keep a
  /// class, only teachers keep class assignments, only students and the
  /// administrator keep credentials.
  pub fn normalized(mut self) -> Self {
    if self.role != Role::Student {
      self.class_id = None;
    }
    if self.role != Role::Teacher {
      self.assigned_class_ids.clear();
    }
    if !self.role.has_credentials() {
      self.username.clear();
      self.password.clear();
    }
    self
  }

  /// Whether this teacher is assigned to `class_id`.
  pub fn teaches(&self, class_id: &str) -> bool {
    self.role == Role::Teacher
      && self.assigned_class_ids.iter().any(|c| c == class_id)
  }
}

/// Resolve a class reference to its display name.
pub fn class_label<'a>(class_id: Option<&str>, classes: &'a [ClassGroup]) -> &'a str {
  class_id
    .and_then(|id| classes.iter().find(|c| c.id == id))
    .map(|c| c.name.as_str())
    .unwrap_or(UNASSIGNED_LABEL)
}

/// Resolve a user reference to its display name.
pub fn user_label<'a>(user_id: &str, users: &'a [User]) -> &'a str {
  users
    .iter()
    .find(|u| u.id == user_id)
    .map(|u| u.full_name.as_str())
    .unwrap_or(UNKNOWN_LABEL)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalized_drops_fields_irrelevant_to_the_role() {
    let mut teacher = User::new("t1", "M. Dupont", Role::Teacher);
    teacher.class_id = Some("c1".into());
    teacher.assigned_class_ids = vec!["c1".into()];
    teacher.username = "dupont".into();
    teacher.password = "secret".into();

    let teacher = teacher.normalized();
    assert_eq!(teacher.class_id, None);
    assert_eq!(teacher.assigned_class_ids, vec!["c1".to_string()]);
    assert!(teacher.username.is_empty());
    assert!(teacher.password.is_empty());

    let mut student = User::new("s1", "Lucas", Role::Student);
    student.class_id = Some("c1".into());
    student.assigned_class_ids = vec!["c2".into()];
    student.username = "eleve1".into();

    let student = student.normalized();
    assert_eq!(student.class_id.as_deref(), Some("c1"));
    assert!(student.assigned_class_ids.is_empty());
    assert_eq!(student.username, "eleve1");
  }

  #[test]
  fn dangling_references_resolve_to_fallbacks() {
    let classes = vec![ClassGroup { id: "c1".into(), name: "6ème A".into() }];
    assert_eq!(class_label(Some("c1"), &classes), "6ème A");
    assert_eq!(class_label(Some("gone"), &classes), UNASSIGNED_LABEL);
    assert_eq!(class_label(None, &classes), UNASSIGNED_LABEL);

    let users = vec![User::new("u1", "Mme Martin", Role::Supervisor)];
    assert_eq!(user_label("u1", &users), "Mme Martin");
    assert_eq!(user_label("u2", &users), UNKNOWN_LABEL);
  }
}
