//! Who may evaluate whom, with which actions, and who sits in whose class.
//!
//! All functions here are pure and work on already-fetched collections. An
//! empty input is a valid input and yields an empty output.

use serde::Serialize;

use crate::{
  catalog::{ActionCatalog, ActionDefinition},
  role::Role,
  user::{ClassGroup, User, class_label},
};

/// Adults `actor` may log a point event against.
///
/// Inactive users and non-adults are dropped. A student only sees the
/// teachers assigned to their own class; supervisors and direction are
/// visible to everyone. `search` is a case-insensitive substring filter on
/// the full name; a blank term matches everything.
pub fn eligible_targets<'a>(
  actor: &User,
  users: &'a [User],
  search: Option<&str>,
) -> Vec<&'a User> {
  let needle = search
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_lowercase);

  users
    .iter()
    .filter(|u| u.active && u.role.is_adult())
    .filter(|u| match actor.role {
      Role::Student if u.role == Role::Teacher => actor
        .class_id
        .as_deref()
        .is_some_and(|class_id| u.teaches(class_id)),
      _ => true,
    })
    .filter(|u| {
      needle
        .as_deref()
        .is_none_or(|n| u.full_name.to_lowercase().contains(n))
    })
    .collect()
}

/// Catalog entries applicable to `target`, in catalog order.
///
/// A target that cannot be evaluated yields no actions. The free-text choice
/// is appended by the caller.
pub fn eligible_actions<'c, C: ActionCatalog + ?Sized>(
  catalog: &'c C,
  target: &User,
) -> Vec<&'c ActionDefinition> {
  match target.role.target_role() {
    Some(tag) => catalog.for_target(tag),
    None => Vec::new(),
  }
}

/// The "my class" view for an actor.
#[derive(Debug, Clone, Serialize)]
pub struct Roster<'a> {
  pub title:    String,
  /// Students in the actor's class (student) or assigned classes (teacher).
  pub students: Vec<&'a User>,
  /// Teachers assigned to the student's class; empty for teachers.
  pub teachers: Vec<&'a User>,
}

impl Roster<'_> {
  fn empty() -> Self {
    Self { title: String::new(), students: Vec::new(), teachers: Vec::new() }
  }
}

/// Build the class roster shown to `actor`.
///
/// Inactive students are listed (the view shows their status); only roles
/// with a class link get a non-empty roster.
pub fn class_roster<'a>(
  actor: &User,
  users: &'a [User],
  classes: &[ClassGroup],
) -> Roster<'a> {
  match actor.role {
    Role::Student => {
      let Some(class_id) = actor.class_id.as_deref() else {
        return Roster::empty();
      };
      Roster {
        title:    format!("Ma classe : {}", class_label(Some(class_id), classes)),
        students: users
          .iter()
          .filter(|u| u.role == Role::Student && u.class_id.as_deref() == Some(class_id))
          .collect(),
        teachers: users.iter().filter(|u| u.teaches(class_id)).collect(),
      }
    }
    Role::Teacher => {
      let names: Vec<&str> = classes
        .iter()
        .filter(|c| actor.assigned_class_ids.contains(&c.id))
        .map(|c| c.name.as_str())
        .collect();
      Roster {
        title:    format!("Mes classes : {}", names.join(", ")),
        students: users
          .iter()
          .filter(|u| {
            u.role == Role::Student
              && u
                .class_id
                .as_ref()
                .is_some_and(|c| actor.assigned_class_ids.contains(c))
          })
          .collect(),
        teachers: Vec::new(),
      }
    }
    _ => Roster::empty(),
  }
}
