//! JSON REST API for Éval'École.
//!
//! Exposes an axum [`Router`] backed by any [`EntityStore`]. Every request
//! except `GET /api/status` carries HTTP Basic credentials checked against
//! the store's users, and is refused with `503` while the store still needs
//! provisioning.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = evalecole_api::router(AppState::new(store, setup_script));
//! axum::serve(listener, app).await?;
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod points;
pub mod screens;
pub mod session;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  extract::{Request, State},
  middleware::{self, Next},
  response::Response,
  routing::{delete, get},
};
use chrono::{DateTime, FixedOffset, Local};
use evalecole_core::{
  scoring::WeekWindow,
  store::{EntityStore, StoreStatus},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:        Arc<S>,
  /// Returned by the provisioning gate.
  pub setup_script: Arc<str>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), setup_script: Arc::clone(&self.setup_script) }
  }
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, setup_script: impl Into<Arc<str>>) -> Self {
    Self { store, setup_script: setup_script.into() }
  }
}

// ─── Week selection ──────────────────────────────────────────────────────────

/// `?at=<rfc3339>` selects the week containing that instant, in its own
/// offset. Without it the server's local clock decides.
#[derive(Debug, Default, Deserialize)]
pub struct WeekParams {
  pub at: Option<DateTime<FixedOffset>>,
}

impl WeekParams {
  pub fn window(&self) -> WeekWindow {
    match &self.at {
      Some(at) => WeekWindow::containing(at),
      None => WeekWindow::containing(&Local::now()),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`, nested under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: EntityStore + 'static,
{
  let gated = Router::new()
    // Session
    .route("/me", get(session::me::<S>))
    // Screens
    .route("/dashboard", get(screens::dashboard::<S>))
    .route("/my-class", get(screens::my_class::<S>))
    .route("/classes", get(screens::classes::<S>).post(admin::create_class::<S>))
    .route("/rankings", get(screens::rankings::<S>))
    .route("/rankings/{id}", get(screens::drill_down::<S>))
    // Points
    .route("/targets", get(points::targets::<S>))
    .route("/targets/{id}/actions", get(points::target_actions::<S>))
    .route("/events", get(admin::list_events::<S>).post(points::submit::<S>).delete(admin::reset_all::<S>))
    // Administration
    .route("/users", get(admin::list_users::<S>).post(admin::create_user::<S>))
    .route(
      "/users/{id}",
      get(admin::get_user::<S>).put(admin::update_user::<S>).delete(admin::delete_user::<S>),
    )
    .route("/users/{id}/score", get(admin::score::<S>).post(admin::adjust::<S>))
    .route("/users/{id}/events", delete(admin::reset_user::<S>))
    .route("/classes/{id}", delete(admin::delete_class::<S>))
    .route_layer(middleware::from_fn_with_state(state.clone(), provisioning_gate::<S>));

  let api = gated.route("/status", get(session::status::<S>));

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Refuse everything with the setup script until the schema exists.
async fn provisioning_gate<S>(
  State(state): State<AppState<S>>,
  req: Request,
  next: Next,
) -> Result<Response, ApiError>
where
  S: EntityStore + 'static,
{
  match state.store.initialize().await.map_err(ApiError::store)? {
    StoreStatus::Ready => Ok(next.run(req).await),
    StoreStatus::NeedsProvisioning => {
      tracing::warn!(uri = %req.uri(), "request refused: store not provisioned");
      Err(ApiError::ProvisioningRequired(state.setup_script.to_string()))
    }
  }
}
