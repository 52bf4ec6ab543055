//! HTTP Basic-auth extractor resolving to a [`Session`].
//!
//! Credentials are checked against the live user collection on every
//! request, so deactivating or deleting a user takes effect immediately.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use evalecole_core::{
  navigation::Route,
  session::{Session, authenticate},
  store::EntityStore,
};

use crate::{AppState, error::ApiError};

/// An authenticated caller.
pub struct Authenticated(pub Session);

impl Authenticated {
  /// The session, if its role may open `route`.
  pub fn require(self, route: Route) -> Result<Session, ApiError> {
    if route.permits(self.0.role()) {
      Ok(self.0)
    } else {
      tracing::debug!(user = %self.0.user().id, ?route, "route refused");
      Err(ApiError::Forbidden(route))
    }
  }

  pub fn into_session(self) -> Session { self.0 }
}

/// Split a `Basic` authorization header into username and password.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = value.strip_prefix("Basic ").ok_or(ApiError::Unauthorized)?;
  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((username.to_owned(), password.to_owned()))
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: EntityStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (username, password) = basic_credentials(&parts.headers)?;
    let users = state.store.list_users().await.map_err(ApiError::store)?;
    match authenticate(&users, &username, &password) {
      Some(session) => Ok(Authenticated(session)),
      None => {
        tracing::info!(%username, "login refused");
        Err(ApiError::Unauthorized)
      }
    }
  }
}
