//! Key-value state file holding the persisted session.
//!
//! The file is a flat JSON object. The session lives under
//! [`SESSION_KEY`]; other keys are left untouched when it is written or
//! cleared.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use evalecole_core::session::{SESSION_KEY, Session};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What survives a restart: the session plus the credentials needed to
/// revalidate it against the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
  pub username: String,
  pub password: String,
  pub session:  Session,
}

pub struct StateFile {
  path: PathBuf,
}

impl StateFile {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  fn read_map(&self) -> Result<Map<String, Value>> {
    match std::fs::read_to_string(&self.path) {
      Ok(raw) => serde_json::from_str(&raw)
        .with_context(|| format!("parsing state file {}", self.path.display())),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
      Err(e) => Err(e).with_context(|| format!("reading state file {}", self.path.display())),
    }
  }

  fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      std::fs::create_dir_all(dir)
        .with_context(|| format!("creating state directory {}", dir.display()))?;
    }
    let raw = serde_json::to_string_pretty(map)?;
    std::fs::write(&self.path, raw)
      .with_context(|| format!("writing state file {}", self.path.display()))
  }

  /// The persisted session. A missing or unreadable entry counts as none.
  pub fn load_session(&self) -> Option<SavedSession> {
    let map = self
      .read_map()
      .inspect_err(|e| tracing::warn!(error = %e, "ignoring state file"))
      .ok()?;
    let value = map.get(SESSION_KEY)?.clone();
    serde_json::from_value(value)
      .inspect_err(|e| tracing::warn!(error = %e, "ignoring stored session"))
      .ok()
  }

  pub fn save_session(&self, saved: &SavedSession) -> Result<()> {
    let mut map = self.read_map().unwrap_or_default();
    map.insert(SESSION_KEY.to_owned(), serde_json::to_value(saved)?);
    self.write_map(&map)
  }

  pub fn clear_session(&self) -> Result<()> {
    let mut map = self.read_map().unwrap_or_default();
    if map.remove(SESSION_KEY).is_some() {
      self.write_map(&map)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use evalecole_core::{seed::demo, session::authenticate};

  use super::*;

  fn temp_file(name: &str) -> StateFile {
    let dir = std::env::temp_dir().join(format!("evalecole-state-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    StateFile::new(dir.join("state.json"))
  }

  fn saved() -> SavedSession {
    let session = authenticate(&demo().users, "eleve1", "123").unwrap();
    SavedSession { username: "eleve1".into(), password: "123".into(), session }
  }

  #[test]
  fn missing_file_has_no_session() {
    assert!(temp_file("missing").load_session().is_none());
  }

  #[test]
  fn session_round_trips_and_keeps_other_keys() {
    let file = temp_file("round-trip");
    std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
    std::fs::write(file.path(), r#"{"theme":"dark"}"#).unwrap();

    file.save_session(&saved()).unwrap();
    assert_eq!(file.load_session(), Some(saved()));

    file.clear_session().unwrap();
    assert!(file.load_session().is_none());
    let raw = std::fs::read_to_string(file.path()).unwrap();
    assert!(raw.contains("dark"));
  }

  #[test]
  fn corrupt_file_counts_as_logged_out() {
    let file = temp_file("corrupt");
    std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
    std::fs::write(file.path(), "not json").unwrap();
    assert!(file.load_session().is_none());
    file.save_session(&saved()).unwrap();
    assert!(file.load_session().is_some());
  }
}
