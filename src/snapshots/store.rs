//! Snapshot persistence interface.

use crate::snapshots::types::{ConfigurationSnapshot, NewSnapshot, PersistenceResult, SnapshotId};

/// Durable, versioned history of configuration documents.
///
/// Implementations own the single-active invariant: after `activate(id)`
/// returns, `id` is the only active snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Highest version saved so far, or 0 when the store is empty.
    fn latest_version(&self) -> PersistenceResult<i64>;

    /// Persist a new snapshot and return it with its assigned id.
    fn save(&self, snapshot: NewSnapshot) -> PersistenceResult<ConfigurationSnapshot>;

    /// Look up a snapshot by id.
    fn get(&self, id: SnapshotId) -> PersistenceResult<Option<ConfigurationSnapshot>>;

    /// Mark `id` active and every other snapshot inactive, atomically.
    fn activate(&self, id: SnapshotId) -> PersistenceResult<()>;

    /// Most recent snapshots first (by creation time, then id).
    fn list(&self, limit: usize) -> PersistenceResult<Vec<ConfigurationSnapshot>>;

    /// The currently active snapshot, if any.
    fn active(&self) -> PersistenceResult<Option<ConfigurationSnapshot>>;
}
