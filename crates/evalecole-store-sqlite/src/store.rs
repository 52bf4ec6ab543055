//! [`SqliteStore`]: the SQLite implementation of [`EntityStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use evalecole_core::{
  event::PointEvent,
  store::{EntityStore, StoreStatus},
  user::{ClassGroup, User},
};

use crate::{
  Result,
  encode::{EVENT_COLUMNS, EventParams, RawClass, RawEvent, RawUser, USER_COLUMNS, UserParams},
  schema::{SCHEMA, SEED},
};

/// Queries that must succeed for the store to count as provisioned. They
/// select every column the store reads, so a table with a stale layout fails
/// the probe too.
const PROBES: [&str; 3] = [
  "SELECT id, name FROM classes LIMIT 0",
  "SELECT id, full_name, username, password, role, active, class_id, assigned_class_ids \
   FROM users LIMIT 0",
  "SELECT id, date_time, created_by_id, student_id, target_user_id, action_id, custom_label, \
   points FROM events LIMIT 0",
];

// ─── Store ───────────────────────────────────────────────────────────────────

/// An entity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Opening never
/// creates tables: see [`SqliteStore::provision`].
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) the database file at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    tracing::debug!(path = %path.display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  /// Open an empty in-memory database: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  /// Create the tables and, when `with_seed` is set, insert the starting
  /// data. Safe to run on an already provisioned database.
  pub async fn provision(&self, with_seed: bool) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        if with_seed {
          conn.execute_batch(SEED)?;
        }
        Ok(())
      })
      .await?;
    tracing::info!(with_seed, "sqlite store provisioned");
    Ok(())
  }
}

// ─── EntityStore impl ────────────────────────────────────────────────────────

impl EntityStore for SqliteStore {
  type Error = crate::Error;

  async fn initialize(&self) -> Result<StoreStatus> {
    let failed: Option<(&'static str, String)> = self
      .conn
      .call(|conn| {
        Ok(PROBES.iter().find_map(|sql| {
          conn.prepare(sql).err().map(|e| (*sql, e.to_string()))
        }))
      })
      .await?;

    Ok(match failed {
      None => StoreStatus::Ready,
      Some((probe, error)) => {
        tracing::warn!(probe, %error, "schema probe failed");
        StoreStatus::NeedsProvisioning
      }
    })
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // A malformed row is skipped here; `get_user` still reports it.
    Ok(
      raws
        .into_iter()
        .filter_map(|raw| {
          let id = raw.id.clone();
          raw
            .into_user()
            .inspect_err(|error| tracing::warn!(user = %id, %error, "skipping malformed user row"))
            .ok()
        })
        .collect(),
    )
  }

  async fn get_user(&self, id: &str) -> Result<Option<User>> {
    let id = id.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
              rusqlite::params![id],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn upsert_user(&self, user: User) -> Result<()> {
    let p = UserParams::encode(user)?;

    // ON CONFLICT keeps the rowid, and with it the listing order.
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
               full_name = excluded.full_name,
               username = excluded.username,
               password = excluded.password,
               role = excluded.role,
               active = excluded.active,
               class_id = excluded.class_id,
               assigned_class_ids = excluded.assigned_class_ids"
          ),
          rusqlite::params![
            p.id,
            p.full_name,
            p.username,
            p.password,
            p.role,
            p.active,
            p.class_id,
            p.assigned_class_ids,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_user(&self, id: &str) -> Result<()> {
    let id = id.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Classes ───────────────────────────────────────────────────────────────

  async fn list_classes(&self) -> Result<Vec<ClassGroup>> {
    let raws: Vec<RawClass> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id, name FROM classes ORDER BY rowid")?;
        let rows = stmt
          .query_map([], RawClass::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawClass::into_class).collect())
  }

  async fn add_class(&self, name: String) -> Result<ClassGroup> {
    let class = ClassGroup { id: evalecole_core::new_id(), name };

    let (id, name) = (class.id.clone(), class.name.clone());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO classes (id, name) VALUES (?1, ?2)",
          rusqlite::params![id, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(class)
  }

  async fn delete_class(&self, id: &str) -> Result<()> {
    let id = id.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM classes WHERE id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn list_events(&self) -> Result<Vec<PointEvent>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn list_events_for_target(&self, target_id: &str) -> Result<Vec<PointEvent>> {
    let target_id = target_id.to_owned();

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events WHERE target_user_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![target_id], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn append_event(&self, event: PointEvent) -> Result<()> {
    let p = EventParams::encode(event);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO events ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
          rusqlite::params![
            p.id,
            p.date_time,
            p.created_by_id,
            p.student_id,
            p.target_user_id,
            p.action_id,
            p.custom_label,
            p.points,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_all_events(&self) -> Result<()> {
    let deleted = self
      .conn
      .call(|conn| Ok(conn.execute("DELETE FROM events", [])?))
      .await?;
    tracing::info!(deleted, "event log reset");
    Ok(())
  }

  async fn delete_events_for_target(&self, target_id: &str) -> Result<()> {
    let id = target_id.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM events WHERE target_user_id = ?1", rusqlite::params![id])?)
      })
      .await?;
    tracing::info!(target_id, deleted, "events reset for target");
    Ok(())
  }
}
