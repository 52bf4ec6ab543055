//! The `EntityStore` trait.
//!
//! Backends (`MemoryStore` here, `evalecole-store-sqlite`) implement it; the
//! API layer depends on this abstraction only. The rule engine never talks to
//! a store: callers fetch collections first and hand them over.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  event::PointEvent,
  user::{ClassGroup, User},
};

/// Outcome of [`EntityStore::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
  Ready,
  /// The schema is missing or unreadable; an operator must run the setup
  /// script before anything else works.
  NeedsProvisioning,
}

/// Persistence for users, classes and events.
///
/// There are no transactions spanning several calls: callers re-read whole
/// collections after writing instead of patching local copies.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait EntityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Probe the backing schema.
  fn initialize(&self) -> impl Future<Output = Result<StoreStatus, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  fn list_users(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Returns `None` if no user has this id.
  fn get_user<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Insert, or replace the user with the same id.
  fn upsert_user(&self, user: User) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Deleting an unknown id is not an error. Events targeting the user are
  /// kept.
  fn delete_user<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Classes ───────────────────────────────────────────────────────────

  fn list_classes(&self) -> impl Future<Output = Result<Vec<ClassGroup>, Self::Error>> + Send + '_;

  /// Create a class with a store-generated id.
  fn add_class(
    &self,
    name: String,
  ) -> impl Future<Output = Result<ClassGroup, Self::Error>> + Send + '_;

  /// Does not touch students or teachers referencing the class.
  fn delete_class<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Events ────────────────────────────────────────────────────────────

  fn list_events(&self) -> impl Future<Output = Result<Vec<PointEvent>, Self::Error>> + Send + '_;

  fn list_events_for_target<'a>(
    &'a self,
    target_id: &'a str,
  ) -> impl Future<Output = Result<Vec<PointEvent>, Self::Error>> + Send + 'a;

  fn append_event(
    &self,
    event: PointEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Full reset of the event log.
  fn delete_all_events(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Per-user reset.
  fn delete_events_for_target<'a>(
    &'a self,
    target_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
