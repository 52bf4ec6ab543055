//! Read-only handlers behind the main screens.
//!
//! | Method | Path | Route |
//! |--------|------|-------|
//! | `GET`  | `/dashboard[?at=]` | Dashboard |
//! | `GET`  | `/my-class` | MyClass |
//! | `GET`  | `/classes` | any session |
//! | `GET`  | `/rankings[?at=]` | Rankings |
//! | `GET`  | `/rankings/{id}[?at=]` | Rankings; 404 unless the user is an adult |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use evalecole_core::{
  catalog::StaticCatalog,
  navigation::Route,
  store::EntityStore,
  user::ClassGroup,
  views::{DashboardView, DrillDown, RankingsBoard, RosterView},
  visibility::class_roster,
};

use crate::{AppState, WeekParams, auth::Authenticated, error::ApiError};

/// `GET /dashboard`
pub async fn dashboard<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Query(params): Query<WeekParams>,
) -> Result<Json<DashboardView>, ApiError>
where
  S: EntityStore + 'static,
{
  let session = auth.require(Route::Dashboard)?;
  let (users, events) = tokio::try_join!(state.store.list_users(), state.store.list_events())
    .map_err(ApiError::store)?;
  Ok(Json(DashboardView::build(&session, &users, &events, params.window())))
}

/// `GET /my-class`
pub async fn my_class<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<RosterView>, ApiError>
where
  S: EntityStore + 'static,
{
  let session = auth.require(Route::MyClass)?;
  let (users, classes) = tokio::try_join!(state.store.list_users(), state.store.list_classes())
    .map_err(ApiError::store)?;
  Ok(Json(class_roster(session.user(), &users, &classes).into()))
}

/// `GET /classes`
pub async fn classes<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<Vec<ClassGroup>>, ApiError>
where
  S: EntityStore + 'static,
{
  let classes = state.store.list_classes().await.map_err(ApiError::store)?;
  Ok(Json(classes))
}

/// `GET /rankings`
pub async fn rankings<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Query(params): Query<WeekParams>,
) -> Result<Json<RankingsBoard>, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::Rankings)?;
  let (users, events) = tokio::try_join!(state.store.list_users(), state.store.list_events())
    .map_err(ApiError::store)?;
  Ok(Json(RankingsBoard::build(&users, &events, params.window())))
}

/// `GET /rankings/{id}`
pub async fn drill_down<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<String>,
  Query(params): Query<WeekParams>,
) -> Result<Json<DrillDown>, ApiError>
where
  S: EntityStore + 'static,
{
  auth.require(Route::Rankings)?;
  let (user, events) =
    tokio::try_join!(state.store.get_user(&id), state.store.list_events_for_target(&id))
      .map_err(ApiError::store)?;
  let user = user
    .filter(|u| u.role.is_adult())
    .ok_or_else(|| ApiError::NotFound(format!("no ranked user {id}")))?;
  Ok(Json(DrillDown::build(&user, &events, &params.window(), &StaticCatalog)))
}
