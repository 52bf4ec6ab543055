//! Server wiring for Éval'École: configuration, backend selection and the
//! HTTP listener around [`evalecole_api::router`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use evalecole_api::AppState;
use evalecole_core::{
  memory::MemoryStore,
  seed,
  store::{EntityStore, StoreStatus},
};
use evalecole_store_sqlite::{SqliteStore, schema};
use serde::Deserialize;
use tokio::net::TcpListener;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Which [`EntityStore`] backs the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Sqlite,
  /// Process-local; lost on restart.
  Memory,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `EVALECOLE_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub backend:    Backend,
  pub store_path: PathBuf,
  /// Memory backend only: start from the demo data instead of an empty
  /// store.
  pub seed_demo:  bool,
}

impl ServerConfig {
  /// Layer defaults, the optional file at `path` and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("backend", "sqlite")?
      .set_default("store_path", "evalecole.db")?
      .set_default("seed_demo", true)?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("EVALECOLE"))
      .build()
      .context("failed to read config file")?;

    settings.try_deserialize().context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

// ─── Serving ─────────────────────────────────────────────────────────────────

/// Open the configured backend and serve until the listener fails.
pub async fn run(cfg: &ServerConfig) -> anyhow::Result<()> {
  match cfg.backend {
    Backend::Sqlite => {
      let path = cfg.resolved_store_path();
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      serve(cfg, Arc::new(store)).await
    }
    Backend::Memory => {
      let store = if cfg.seed_demo {
        MemoryStore::seeded(seed::demo())
      } else {
        MemoryStore::new()
      };
      serve(cfg, Arc::new(store)).await
    }
  }
}

/// Serve the API over `store`.
pub async fn serve<S>(cfg: &ServerConfig, store: Arc<S>) -> anyhow::Result<()>
where
  S: EntityStore + 'static,
{
  match store.initialize().await.context("failed to probe store")? {
    StoreStatus::Ready => tracing::info!(backend = ?cfg.backend, "store ready"),
    StoreStatus::NeedsProvisioning => tracing::warn!(
      backend = ?cfg.backend,
      "store needs provisioning; run `evalecole-server provision` or apply `evalecole-server schema`"
    ),
  }

  let app = evalecole_api::router(AppState::new(store, schema::setup_script()));
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

/// Create the SQLite schema (and, unless `with_seed` is false, the starting
/// data) at the configured path.
pub async fn provision(cfg: &ServerConfig, with_seed: bool) -> anyhow::Result<()> {
  anyhow::ensure!(
    cfg.backend == Backend::Sqlite,
    "provisioning only applies to the sqlite backend"
  );
  let path = cfg.resolved_store_path();
  let store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))?;
  store.provision(with_seed).await.context("failed to run setup script")?;
  tracing::info!(path = %path.display(), "store provisioned");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/evalecole.toml")).unwrap();
    assert_eq!(cfg.backend, Backend::Sqlite);
    assert_eq!(cfg.store_path, PathBuf::from("evalecole.db"));
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let plain = Path::new("/var/lib/evalecole.db");
    assert_eq!(expand_tilde(plain), plain);
    let odd = Path::new("data/~/evalecole.db");
    assert_eq!(expand_tilde(odd), odd);
  }

  #[tokio::test]
  async fn provisioning_refuses_the_memory_backend() {
    let cfg = ServerConfig {
      host:       "127.0.0.1".into(),
      port:       0,
      backend:    Backend::Memory,
      store_path: PathBuf::from(":memory:"),
      seed_demo:  false,
    };
    assert!(provision(&cfg, true).await.is_err());
  }
}
