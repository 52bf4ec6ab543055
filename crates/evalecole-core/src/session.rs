//! The authenticated identity and the confirmation gate for destructive
//! administration.

use serde::{Deserialize, Serialize};

use crate::{
  navigation::{self, Route},
  role::Role,
  user::User,
};

/// Key under which clients persist the serialized [`Session`].
pub const SESSION_KEY: &str = "eval_ecole_session";

// ─── Session ─────────────────────────────────────────────────────────────────

/// The logged-in user, owned by whoever drives the views and handed to them
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  user: User,
}

impl Session {
  /// A session for a user whose credentials were checked elsewhere, e.g. by
  /// the API on a remote client's behalf. Inactive users get none.
  pub fn verified(user: User) -> Option<Self> { user.active.then_some(Self { user }) }

  pub fn user(&self) -> &User { &self.user }

  pub fn role(&self) -> Role { self.user.role }

  pub fn into_user(self) -> User { self.user }

  pub fn menu(&self) -> Vec<Route> { navigation::menu(self.user.role) }

  /// Where a navigation request to `route` actually lands.
  pub fn navigate(&self, route: Route) -> Route { navigation::resolve(self.user.role, route) }
}

/// Log in with exact username and password. Inactive users and empty
/// credentials never match.
pub fn authenticate(users: &[User], username: &str, password: &str) -> Option<Session> {
  if username.is_empty() || password.is_empty() {
    return None;
  }
  users
    .iter()
    .find(|u| u.active && u.username == username && u.password == password)
    .map(|u| Session { user: u.clone() })
}

/// Revalidate a cached session against the store's current record for the
/// same id. The fresh record replaces the cached one; a missing or inactive
/// user ends the session.
pub fn restore(cached: &Session, fresh: Option<User>) -> Option<Session> {
  fresh
    .filter(|u| u.id == cached.user.id && u.active)
    .map(|user| Session { user })
}

// ─── Confirmation ────────────────────────────────────────────────────────────

/// An irreversible administrative operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DestructiveOp {
  ResetAllPoints,
  ResetUserPoints { user_id: String, full_name: String },
  DeleteUser { user_id: String, full_name: String },
  DeleteClass { class_id: String, name: String },
}

impl DestructiveOp {
  /// Text of the first confirmation.
  pub fn prompt(&self) -> String {
    match self {
      Self::ResetAllPoints => {
        "ATTENTION : vous êtes sur le point de supprimer TOUS les points de l'application."
          .to_owned()
      }
      Self::ResetUserPoints { full_name, .. } => {
        format!("Voulez-vous remettre à zéro les points de {full_name} ?")
      }
      Self::DeleteUser { full_name, .. } => {
        format!("Êtes-vous sûr de vouloir supprimer {full_name} ?")
      }
      Self::DeleteClass { name, .. } => {
        format!("Supprimer la classe {name} ? Les élèves liés perdront leur affiliation.")
      }
    }
  }
}

/// Text of the second confirmation, shared by every operation.
pub const FINAL_PROMPT: &str = "Êtes-vous vraiment sûr ? Cette action est irréversible.";

/// Which confirmation is currently asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmStep {
  First,
  Final,
}

/// Two-step confirmation in front of a [`DestructiveOp`].
#[derive(Debug, Clone, Default)]
pub struct ConfirmGate {
  pending: Option<(DestructiveOp, ConfirmStep)>,
}

impl ConfirmGate {
  pub fn new() -> Self { Self::default() }

  /// Arm the gate for `op`, discarding whatever was pending.
  pub fn request(&mut self, op: DestructiveOp) { self.pending = Some((op, ConfirmStep::First)); }

  pub fn pending(&self) -> Option<(&DestructiveOp, ConfirmStep)> {
    self.pending.as_ref().map(|(op, step)| (op, *step))
  }

  /// The question to show for the pending step.
  pub fn prompt(&self) -> Option<String> {
    self.pending.as_ref().map(|(op, step)| match step {
      ConfirmStep::First => op.prompt(),
      ConfirmStep::Final => FINAL_PROMPT.to_owned(),
    })
  }

  /// Answer yes to the pending step. The operation is released only by the
  /// second confirmation.
  pub fn confirm(&mut self) -> Option<DestructiveOp> {
    match self.pending.take()? {
      (op, ConfirmStep::First) => {
        self.pending = Some((op, ConfirmStep::Final));
        None
      }
      (op, ConfirmStep::Final) => Some(op),
    }
  }

  /// Answer no; the pending operation is dropped.
  pub fn cancel(&mut self) { self.pending = None; }
}
