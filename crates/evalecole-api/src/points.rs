//! Handlers for the point-submission flow.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/targets[?search=]` | Adults the caller may evaluate |
//! | `GET`  | `/targets/{id}/actions` | 404 if the target is not eligible |
//! | `POST` | `/events` | Body: an `EventRequest`; 422 when it fails validation |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use evalecole_core::{
  catalog::StaticCatalog,
  navigation::Route,
  store::EntityStore,
  submission::EventRequest,
  views::{Member, TargetActions},
  visibility::{eligible_actions, eligible_targets},
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Targets ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TargetParams {
  pub search: Option<String>,
}

/// `GET /targets[?search=<term>]`
pub async fn targets<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Query(params): Query<TargetParams>,
) -> Result<Json<Vec<Member>>, ApiError>
where
  S: EntityStore + 'static,
{
  let session = auth.require(Route::AddPoints)?;
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  let targets = eligible_targets(session.user(), &users, params.search.as_deref());
  Ok(Json(targets.into_iter().map(Member::from).collect()))
}

/// `GET /targets/{id}/actions`
pub async fn target_actions<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<String>,
) -> Result<Json<TargetActions>, ApiError>
where
  S: EntityStore + 'static,
{
  let session = auth.require(Route::AddPoints)?;
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  let target = eligible_targets(session.user(), &users, None)
    .into_iter()
    .find(|u| u.id == id)
    .ok_or_else(|| ApiError::NotFound(format!("no eligible target {id}")))?;
  Ok(Json(TargetActions::new(target, eligible_actions(&StaticCatalog, target))))
}

// ─── Submit ──────────────────────────────────────────────────────────────────

/// `POST /events`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(request): Json<EventRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntityStore + 'static,
{
  let session = auth.require(Route::AddPoints)?;
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  let event = request.into_event(session.user(), &users, &StaticCatalog, Utc::now())?;

  let (id, target_id) = (event.id.clone(), event.target_user_id.clone());
  state.store.append_event(event).await.map_err(ApiError::store)?;
  tracing::info!(event = %id, target = %target_id, actor = %session.user().id, "points recorded");

  let stored = state
    .store
    .list_events_for_target(&target_id)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .find(|e| e.id == id)
    .ok_or_else(|| ApiError::NotFound(format!("event {id} missing after write")))?;
  Ok((StatusCode::CREATED, Json(stored)))
}
