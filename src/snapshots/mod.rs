//! Versioned configuration snapshots.
//!
//! # Data Flow
//! ```text
//! manager (before every configuration write)
//!     → store.rs (SnapshotStore trait: next version, save)
//!     → memory.rs | sqlite.rs (durable record)
//!
//! manager.restore(id)
//!     → store.get(id) → validate → write live file
//!     → store.activate(id) (exactly one active snapshot)
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable once saved; only the active flag changes
//! - Activation flips every flag in one critical section / transaction
//! - Version numbers are assigned by the caller from `latest_version() + 1`

pub mod memory;
pub mod sqlite;
pub mod store;
pub mod types;

pub use memory::MemorySnapshotStore;
pub use sqlite::SqliteSnapshotStore;
pub use store::SnapshotStore;
pub use types::{ConfigurationSnapshot, ConfigurationType, NewSnapshot, PersistenceError, SnapshotId};
