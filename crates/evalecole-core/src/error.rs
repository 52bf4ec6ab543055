//! Error types for `evalecole-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid record: {0}")]
  InvalidRecord(String),

  #[error("store is not provisioned")]
  NotProvisioned,

  #[error("store lock poisoned")]
  LockPoisoned,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
