//! In-process snapshot store.

use std::sync::{Mutex, MutexGuard};

use crate::snapshots::store::SnapshotStore;
use crate::snapshots::types::{
    ConfigurationSnapshot, NewSnapshot, PersistenceError, PersistenceResult, SnapshotId,
};

/// Snapshot store kept in memory; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<Vec<ConfigurationSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Vec<ConfigurationSnapshot>>> {
        self.inner
            .lock()
            .map_err(|_| PersistenceError::Unavailable("snapshot store lock poisoned".to_string()))
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn latest_version(&self) -> PersistenceResult<i64> {
        Ok(self.lock()?.iter().map(|s| s.version).max().unwrap_or(0))
    }

    fn save(&self, snapshot: NewSnapshot) -> PersistenceResult<ConfigurationSnapshot> {
        let mut snapshots = self.lock()?;
        let next_id = snapshots.iter().map(|s| s.id.0).max().unwrap_or(0) + 1;
        let saved = ConfigurationSnapshot::from_new(SnapshotId(next_id), snapshot);
        snapshots.push(saved.clone());
        Ok(saved)
    }

    fn get(&self, id: SnapshotId) -> PersistenceResult<Option<ConfigurationSnapshot>> {
        Ok(self.lock()?.iter().find(|s| s.id == id).cloned())
    }

    fn activate(&self, id: SnapshotId) -> PersistenceResult<()> {
        let mut snapshots = self.lock()?;
        if !snapshots.iter().any(|s| s.id == id) {
            return Err(PersistenceError::NotFound(id));
        }
        for snapshot in snapshots.iter_mut() {
            snapshot.is_active = snapshot.id == id;
        }
        Ok(())
    }

    fn list(&self, limit: usize) -> PersistenceResult<Vec<ConfigurationSnapshot>> {
        let mut snapshots = self.lock()?.clone();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        snapshots.truncate(limit);
        Ok(snapshots)
    }

    fn active(&self) -> PersistenceResult<Option<ConfigurationSnapshot>> {
        Ok(self.lock()?.iter().find(|s| s.is_active).cloned())
    }
}
