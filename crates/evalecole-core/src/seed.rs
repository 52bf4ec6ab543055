//! Starting data for a freshly provisioned store.

use crate::{
  role::Role,
  user::{ClassGroup, User},
};

const GRADES: [&str; 4] = ["6ème", "5ème", "4ème", "3ème"];
const SECTIONS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

/// Id of the seeded class `"{grade} {section}"`.
pub fn class_id(grade: &str, section: &str) -> String { format!("c_{grade}_{section}") }

/// The seeded data set.
#[derive(Debug, Clone)]
pub struct Seed {
  pub users:   Vec<User>,
  pub classes: Vec<ClassGroup>,
}

/// One administrator, 24 classes from 6ème A to 3ème F, and a handful of
/// staff and students to try the application with.
pub fn demo() -> Seed {
  let classes = GRADES
    .iter()
    .flat_map(|grade| {
      SECTIONS.iter().map(move |section| ClassGroup {
        id:   class_id(grade, section),
        name: format!("{grade} {section}"),
      })
    })
    .collect();

  let mut admin = User::new("u1", "Administrateur", Role::Admin);
  admin.username = "Paul".into();
  admin.password = "Paul2025.".into();

  let mut dupont = User::new("u_prof1", "M. Dupont", Role::Teacher);
  dupont.assigned_class_ids = vec![class_id("6ème", "A"), class_id("6ème", "B")];

  let mut durand = User::new("u_prof2", "Mme Durand", Role::Teacher);
  durand.assigned_class_ids = vec![class_id("6ème", "A")];

  let mut lucas = User::new("u_eleve1", "Lucas", Role::Student);
  lucas.username = "eleve1".into();
  lucas.password = "123".into();
  lucas.class_id = Some(class_id("6ème", "A"));

  Seed {
    users: vec![
      admin,
      dupont,
      durand,
      User::new("u_surv1", "Mme Martin", Role::Supervisor),
      User::new("u_dir1", "M. Le Directeur", Role::Direction),
      lucas,
    ],
    classes,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{session::authenticate, visibility::eligible_targets};

  #[test]
  fn demo_has_every_class() {
    let seed = demo();
    assert_eq!(seed.classes.len(), 24);
    assert_eq!(seed.classes[0].name, "6ème A");
    assert_eq!(seed.classes[23].name, "3ème F");
    assert_eq!(seed.classes[0].id, "c_6ème_A");
  }

  #[test]
  fn demo_accounts_log_in() {
    let seed = demo();
    assert_eq!(authenticate(&seed.users, "Paul", "Paul2025.").map(|s| s.role()), Some(Role::Admin));
    assert_eq!(authenticate(&seed.users, "eleve1", "123").map(|s| s.role()), Some(Role::Student));
  }

  #[test]
  fn demo_student_sees_both_class_teachers() {
    let seed = demo();
    let lucas = seed.users.iter().find(|u| u.id == "u_eleve1").unwrap();
    let names: Vec<&str> = eligible_targets(lucas, &seed.users, None)
      .iter()
      .map(|u| u.full_name.as_str())
      .collect();
    assert_eq!(names, ["M. Dupont", "Mme Durand", "Mme Martin", "M. Le Directeur"]);
  }

  #[test]
  fn demo_users_are_normalized() {
    for user in demo().users {
      assert_eq!(user.clone().normalized(), user);
    }
  }
}
