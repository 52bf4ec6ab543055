//! Role-to-route permission table.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A top-level view of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
  Dashboard,
  MyClass,
  AddPoints,
  Rankings,
  UserManagement,
}

impl Route {
  /// Every route, in menu order.
  pub const ALL: [Route; 5] = [
    Route::Dashboard,
    Route::MyClass,
    Route::AddPoints,
    Route::Rankings,
    Route::UserManagement,
  ];

  /// Whether `role` may open this route.
  ///
  /// | Role       | Dashboard | My class | Add points | Rankings | Users |
  /// |------------|-----------|----------|------------|----------|-------|
  /// | Student    | yes       | yes      | yes        | yes      | no    |
  /// | Teacher    | yes       | yes      | yes        | yes      | no    |
  /// | Supervisor | yes       | no       | yes        | yes      | no    |
  /// | Direction  | yes       | no       | yes        | yes      | no    |
  /// | Accounting | yes       | no       | no         | yes      | no    |
  /// | Admin      | yes       | no       | yes        | yes      | yes   |
  pub fn permits(self, role: Role) -> bool {
    match self {
      Route::Dashboard | Route::Rankings => true,
      Route::MyClass => matches!(role, Role::Student | Role::Teacher),
      Route::AddPoints => role != Role::Accounting,
      Route::UserManagement => role == Role::Admin,
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      Route::Dashboard => "Tableau de bord",
      Route::MyClass => "Ma classe",
      Route::AddPoints => "Ajouter / retirer des points",
      Route::Rankings => "Classement",
      Route::UserManagement => "Utilisateurs",
    }
  }
}

/// The route actually shown when `role` asks for `requested`: unauthorized
/// requests land on the dashboard.
pub fn resolve(role: Role, requested: Route) -> Route {
  if requested.permits(role) { requested } else { Route::Dashboard }
}

/// Routes offered in the menu for `role`.
pub fn menu(role: Role) -> Vec<Route> {
  Route::ALL.into_iter().filter(|r| r.permits(role)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn menus_match_the_permission_table() {
    use Route::*;
    assert_eq!(menu(Role::Student), [Dashboard, MyClass, AddPoints, Rankings]);
    assert_eq!(menu(Role::Teacher), [Dashboard, MyClass, AddPoints, Rankings]);
    assert_eq!(menu(Role::Supervisor), [Dashboard, AddPoints, Rankings]);
    assert_eq!(menu(Role::Direction), [Dashboard, AddPoints, Rankings]);
    assert_eq!(menu(Role::Accounting), [Dashboard, Rankings]);
    assert_eq!(menu(Role::Admin), [Dashboard, AddPoints, Rankings, UserManagement]);
  }

  #[test]
  fn unauthorized_routes_redirect_to_dashboard() {
    assert_eq!(resolve(Role::Accounting, Route::AddPoints), Route::Dashboard);
    assert_eq!(resolve(Role::Student, Route::UserManagement), Route::Dashboard);
    assert_eq!(resolve(Role::Admin, Route::MyClass), Route::Dashboard);
    assert_eq!(resolve(Role::Teacher, Route::MyClass), Route::MyClass);
  }
}
