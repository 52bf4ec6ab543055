//! [`MemoryStore`]: a process-local [`EntityStore`].
//!
//! Used by tests, by the server's `memory` backend and as the reference
//! behaviour for other backends. Nothing survives a restart.

use std::sync::RwLock;

use crate::{
  Error, Result,
  event::PointEvent,
  seed::Seed,
  store::{EntityStore, StoreStatus},
  user::{ClassGroup, User},
};

#[derive(Debug, Default)]
struct Tables {
  users:   Vec<User>,
  classes: Vec<ClassGroup>,
  events:  Vec<PointEvent>,
}

/// Three collections behind one lock.
#[derive(Debug)]
pub struct MemoryStore {
  /// `None` until provisioned.
  tables: RwLock<Option<Tables>>,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

impl MemoryStore {
  /// A provisioned, empty store.
  pub fn new() -> Self { Self { tables: RwLock::new(Some(Tables::default())) } }

  /// A store whose schema does not exist yet. Every operation except
  /// [`initialize`](EntityStore::initialize) and [`provision`](Self::provision)
  /// fails with [`Error::NotProvisioned`].
  pub fn unprovisioned() -> Self { Self { tables: RwLock::new(None) } }

  /// A provisioned store holding `seed`.
  pub fn seeded(seed: Seed) -> Self {
    Self {
      tables: RwLock::new(Some(Tables {
        users:   seed.users,
        classes: seed.classes,
        events:  Vec::new(),
      })),
    }
  }

  /// Create the collections if missing. Existing data is kept.
  pub fn provision(&self, seed: Seed) -> Result<()> {
    let mut guard = self.tables.write().map_err(|_| Error::LockPoisoned)?;
    if guard.is_none() {
      *guard = Some(Tables { users: seed.users, classes: seed.classes, events: Vec::new() });
    }
    Ok(())
  }

  fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R> {
    let guard = self.tables.read().map_err(|_| Error::LockPoisoned)?;
    guard.as_ref().map(f).ok_or(Error::NotProvisioned)
  }

  fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> Result<R> {
    let mut guard = self.tables.write().map_err(|_| Error::LockPoisoned)?;
    guard.as_mut().map(f).ok_or(Error::NotProvisioned)
  }
}

// ─── EntityStore impl ────────────────────────────────────────────────────────

impl EntityStore for MemoryStore {
  type Error = Error;

  async fn initialize(&self) -> Result<StoreStatus> {
    let guard = self.tables.read().map_err(|_| Error::LockPoisoned)?;
    Ok(match *guard {
      Some(_) => StoreStatus::Ready,
      None => StoreStatus::NeedsProvisioning,
    })
  }

  async fn list_users(&self) -> Result<Vec<User>> { self.read(|t| t.users.clone()) }

  async fn get_user(&self, id: &str) -> Result<Option<User>> {
    self.read(|t| t.users.iter().find(|u| u.id == id).cloned())
  }

  async fn upsert_user(&self, user: User) -> Result<()> {
    let user = user.normalized();
    self.write(|t| match t.users.iter_mut().find(|u| u.id == user.id) {
      Some(existing) => *existing = user,
      None => t.users.push(user),
    })
  }

  async fn delete_user(&self, id: &str) -> Result<()> {
    self.write(|t| t.users.retain(|u| u.id != id))
  }

  async fn list_classes(&self) -> Result<Vec<ClassGroup>> { self.read(|t| t.classes.clone()) }

  async fn add_class(&self, name: String) -> Result<ClassGroup> {
    let class = ClassGroup { id: crate::new_id(), name };
    self.write(|t| t.classes.push(class.clone()))?;
    Ok(class)
  }

  async fn delete_class(&self, id: &str) -> Result<()> {
    self.write(|t| t.classes.retain(|c| c.id != id))
  }

  async fn list_events(&self) -> Result<Vec<PointEvent>> { self.read(|t| t.events.clone()) }

  async fn list_events_for_target(&self, target_id: &str) -> Result<Vec<PointEvent>> {
    self.read(|t| {
      t.events
        .iter()
        .filter(|e| e.target_user_id == target_id)
        .cloned()
        .collect()
    })
  }

  async fn append_event(&self, event: PointEvent) -> Result<()> {
    self.write(|t| t.events.push(event))
  }

  async fn delete_all_events(&self) -> Result<()> { self.write(|t| t.events.clear()) }

  async fn delete_events_for_target(&self, target_id: &str) -> Result<()> {
    self.write(|t| t.events.retain(|e| e.target_user_id != target_id))
  }
}
