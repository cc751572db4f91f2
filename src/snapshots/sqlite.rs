//! SQLite-backed snapshot store.
//!
//! # Responsibilities
//! - Persist snapshots in the `configuration_snapshots` table
//! - Enforce the single-active invariant with a partial unique index
//! - Flip the active flag inside one transaction
//!
//! # Design Decisions
//! - One connection behind a mutex; the console's write volume is tiny
//! - Timestamps stored as fixed-width RFC 3339 UTC text so ordering by the
//!   column matches chronological order

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::snapshots::store::SnapshotStore;
use crate::snapshots::types::{
    ConfigurationSnapshot, NewSnapshot, PersistenceError, PersistenceResult, SnapshotId,
};

/// Busy timeout applied to the connection.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS configuration_snapshots (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    version            INTEGER NOT NULL,
    description        TEXT    NOT NULL DEFAULT '',
    configuration_type TEXT    NOT NULL DEFAULT 'server_xml',
    configuration_data TEXT    NOT NULL,
    user_id            TEXT    NOT NULL,
    created_at         TEXT    NOT NULL,
    is_active          INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_snapshots_version ON configuration_snapshots(version);
CREATE INDEX IF NOT EXISTS idx_snapshots_created_at ON configuration_snapshots(created_at);
CREATE UNIQUE INDEX IF NOT EXISTS idx_snapshots_single_active
    ON configuration_snapshots(is_active) WHERE is_active = 1;
";

const SELECT_COLUMNS: &str = "SELECT id, version, description, configuration_type, configuration_data,
        user_id, created_at, is_active FROM configuration_snapshots";

/// Snapshot store persisted in a SQLite database file.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self::init(conn)?;
        tracing::info!(path = %path.display(), "Snapshot store opened");
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> PersistenceResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> PersistenceResult<Self> {
        conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::Unavailable("snapshot database lock poisoned".to_string()))
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn latest_version(&self) -> PersistenceResult<i64> {
        let conn = self.lock()?;
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM configuration_snapshots",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    fn save(&self, snapshot: NewSnapshot) -> PersistenceResult<ConfigurationSnapshot> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO configuration_snapshots
                (version, description, configuration_type, configuration_data, user_id, created_at, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
            params![
                snapshot.version,
                snapshot.description,
                snapshot.configuration_type.as_str(),
                snapshot.configuration_data,
                snapshot.user_id,
                format_timestamp(&snapshot.created_at),
            ],
        )?;
        let id = SnapshotId(conn.last_insert_rowid());
        fetch(&conn, id)?.ok_or(PersistenceError::NotFound(id))
    }

    fn get(&self, id: SnapshotId) -> PersistenceResult<Option<ConfigurationSnapshot>> {
        let conn = self.lock()?;
        fetch(&conn, id)
    }

    fn activate(&self, id: SnapshotId) -> PersistenceResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM configuration_snapshots WHERE id = ?1)",
            params![id.0],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(PersistenceError::NotFound(id));
        }

        tx.execute(
            "UPDATE configuration_snapshots SET is_active = 0 WHERE is_active = 1",
            [],
        )?;
        tx.execute(
            "UPDATE configuration_snapshots SET is_active = 1 WHERE id = ?1",
            params![id.0],
        )?;
        tx.commit()?;

        tracing::debug!(snapshot_id = id.0, "Snapshot activated");
        Ok(())
    }

    fn list(&self, limit: usize) -> PersistenceResult<Vec<ConfigurationSnapshot>> {
        let conn = self.lock()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT ?1",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![limit], SnapshotRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(SnapshotRow::into_snapshot).collect()
    }

    fn active(&self) -> PersistenceResult<Option<ConfigurationSnapshot>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{} WHERE is_active = 1", SELECT_COLUMNS),
            [],
            SnapshotRow::read,
        )
        .optional()?
        .map(SnapshotRow::into_snapshot)
        .transpose()
    }
}

fn fetch(conn: &Connection, id: SnapshotId) -> PersistenceResult<Option<ConfigurationSnapshot>> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_COLUMNS),
        params![id.0],
        SnapshotRow::read,
    )
    .optional()?
    .map(SnapshotRow::into_snapshot)
    .transpose()
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Raw column values, decoded outside the rusqlite row callback.
struct SnapshotRow {
    id: i64,
    version: i64,
    description: String,
    configuration_type: String,
    configuration_data: String,
    user_id: String,
    created_at: String,
    is_active: bool,
}

impl SnapshotRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            version: row.get(1)?,
            description: row.get(2)?,
            configuration_type: row.get(3)?,
            configuration_data: row.get(4)?,
            user_id: row.get(5)?,
            created_at: row.get(6)?,
            is_active: row.get(7)?,
        })
    }

    fn into_snapshot(self) -> PersistenceResult<ConfigurationSnapshot> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| {
                PersistenceError::Corrupt(format!(
                    "snapshot {} has invalid created_at '{}': {}",
                    self.id, self.created_at, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(ConfigurationSnapshot {
            id: SnapshotId(self.id),
            version: self.version,
            description: self.description,
            configuration_type: self.configuration_type.parse()?,
            configuration_data: self.configuration_data,
            user_id: self.user_id,
            created_at,
            is_active: self.is_active,
        })
    }
}
