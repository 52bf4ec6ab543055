//! Handlers for `/status` and `/me`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/status` | No credentials; carries the setup script when unprovisioned |
//! | `GET`  | `/me` | The caller, their menu and their class |

use axum::{Json, extract::State};
use evalecole_core::{
  store::{EntityStore, StoreStatus},
  views::{Me, StatusReport},
};

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /status`
pub async fn status<S>(State(state): State<AppState<S>>) -> Result<Json<StatusReport>, ApiError>
where
  S: EntityStore + 'static,
{
  let status = state.store.initialize().await.map_err(ApiError::store)?;
  let setup_script =
    (status == StoreStatus::NeedsProvisioning).then(|| state.setup_script.to_string());
  Ok(Json(StatusReport { status, setup_script }))
}

/// `GET /me`: also how a client revalidates a cached session.
pub async fn me<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<Me>, ApiError>
where
  S: EntityStore + 'static,
{
  let classes = state.store.list_classes().await.map_err(ApiError::store)?;
  Ok(Json(Me::new(&auth.into_session(), &classes)))
}
