//! Administration handlers. Every endpoint requires the user-management
//! route, i.e. the administrator.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/users` | Full records, credentials included |
//! | `POST`   | `/users` | Body: a `UserDraft`; the id is generated |
//! | `GET`    | `/users/{id}` | 404 if not found |
//! | `PUT`    | `/users/{id}` | Body: a `UserDraft`; 404 if not found |
//! | `DELETE` | `/users/{id}` | Events targeting the user are kept |
//! | `GET`    | `/users/{id}/score` | Lifetime score |
//! | `POST`   | `/users/{id}/score` | Body: `{"new_total":4}` |
//! | `DELETE` | `/users/{id}/events` | Per-user reset |
//! | `POST`   | `/classes` | Body: `{"name":"6ème G"}` |
//! | `DELETE` | `/classes/{id}` | Students keep their dangling reference |
//! | `GET`    | `/events` | The whole log |
//! | `DELETE` | `/events` | Full reset |
//!
//! Writes answer from a fresh read of the store.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use evalecole_core::{
  adjustment::plan_adjustment,
  event::PointEvent,
  navigation::Route,
  scoring::lifetime_score,
  store::EntityStore,
  user::{ClassGroup, User},
  views::{AdjustRequest, AdjustmentReport, ClassDraft, ScoreReport, UserDraft},
};

use crate::{AppState, auth::Authenticated, error::ApiError};

async fn fetch_user<S>(state: &AppState<S>, id: &str) -> Result<User, ApiError>
where
  S: EntityStore + 'static,
{
  state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

fn draft_into_user(draft: UserDraft, id: String) -> Result<User, ApiError> {
  draft.into_user(id).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list_users<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  Ok(Json(users))
}

/// `POST /users`
pub async fn create_user<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(draft): Json<UserDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  let user = draft_into_user(draft, evalecole_core::new_id())?;
  let id = user.id.clone();
  state.store.upsert_user(user).await.map_err(ApiError::store)?;
  tracing::info!(user = %id, "user created");

  Ok((StatusCode::CREATED, Json(fetch_user(&state, &id).await?)))
}

/// `GET /users/{id}`
pub async fn get_user<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<String>,
) -> Result<Json<User>, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  Ok(Json(fetch_user(&state, &id).await?))
}

/// `PUT /users/{id}`
pub async fn update_user<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<String>,
  Json(draft): Json<UserDraft>,
) -> Result<Json<User>, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  fetch_user(&state, &id).await?;
  let user = draft_into_user(draft, id.clone())?;
  state.store.upsert_user(user).await.map_err(ApiError::store)?;
  tracing::info!(user = %id, "user updated");

  Ok(Json(fetch_user(&state, &id).await?))
}

/// `DELETE /users/{id}`
pub async fn delete_user<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  state.store.delete_user(&id).await.map_err(ApiError::store)?;
  tracing::info!(user = %id, "user deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Scores ──────────────────────────────────────────────────────────────────

/// `GET /users/{id}/score`
pub async fn score<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<String>,
) -> Result<Json<ScoreReport>, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  fetch_user(&state, &id).await?;
  let events = state.store.list_events_for_target(&id).await.map_err(ApiError::store)?;
  Ok(Json(ScoreReport { lifetime_score: lifetime_score(&id, &events), user_id: id }))
}

/// `POST /users/{id}/score`: set the lifetime total with one compensating
/// event.
pub async fn adjust<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<String>,
  Json(body): Json<AdjustRequest>,
) -> Result<Json<AdjustmentReport>, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  fetch_user(&state, &id).await?;

  let events = state.store.list_events_for_target(&id).await.map_err(ApiError::store)?;
  let previous = lifetime_score(&id, &events);
  let event = plan_adjustment(&id, &events, body.new_total, Utc::now())
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  if let Some(event) = &event {
    state.store.append_event(event.clone()).await.map_err(ApiError::store)?;
    tracing::info!(user = %id, previous, delta = event.points, "score adjusted");
  }

  let events = state.store.list_events_for_target(&id).await.map_err(ApiError::store)?;
  Ok(Json(AdjustmentReport { previous, current: lifetime_score(&id, &events), event }))
}

/// `DELETE /users/{id}/events`
pub async fn reset_user<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  state.store.delete_events_for_target(&id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Classes ─────────────────────────────────────────────────────────────────

/// `POST /classes`
pub async fn create_class<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(draft): Json<ClassDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  let name = draft.name.trim();
  if name.is_empty() {
    return Err(ApiError::BadRequest("class name is required".into()));
  }

  let created = state.store.add_class(name.to_owned()).await.map_err(ApiError::store)?;
  tracing::info!(class = %created.id, name, "class created");

  let class: ClassGroup = state
    .store
    .list_classes()
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .find(|c| c.id == created.id)
    .ok_or_else(|| ApiError::NotFound(format!("class {} missing after write", created.id)))?;
  Ok((StatusCode::CREATED, Json(class)))
}

/// `DELETE /classes/{id}`
pub async fn delete_class<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  state.store.delete_class(&id).await.map_err(ApiError::store)?;
  tracing::info!(class = %id, "class deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Event log ───────────────────────────────────────────────────────────────

/// `GET /events`
pub async fn list_events<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<Vec<PointEvent>>, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  let events = state.store.list_events().await.map_err(ApiError::store)?;
  Ok(Json(events))
}

/// `DELETE /events`
pub async fn reset_all<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<StatusCode, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::UserManagement)?;
  state.store.delete_all_events().await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
