//! Error type for `evalecole-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] evalecole_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown role label: {0:?}")]
  UnknownRole(String),

  #[error("points out of range: {0}")]
  PointsOutOfRange(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
