//! Configuration manager: the read-validate-snapshot-write workflow.
//!
//! # Data Flow
//! ```text
//! apply(doc):
//!     Unmodified
//!     → Validating   (validate.rs, no side effects)
//!     → Snapshotting (pre-write text saved to the SnapshotStore)
//!     → Writing      (timestamped backup copy, then overwrite)
//!     → Unmodified
//!
//! restore(id):
//!     store.get(id) → parse → validate → write(backup) → store.activate(id)
//! ```
//!
//! # Design Decisions
//! - Validation is a predicate; only `apply`/`restore` turn a failure into an error
//! - A snapshot is never rolled back when the following write fails
//! - One async mutex serializes every mutating sequence
//! - The live write is a plain overwrite; the backup file is the recovery path

pub mod config_manager;
pub mod fs;
pub mod validate;

pub use config_manager::{ApplyOutcome, ConfigManager, ConnectionStatus, ServerStatus, WriteOutcome};
pub use fs::{ConfigFs, LocalFs, MemoryFs};
pub use validate::{validate_document, ValidationError};

use std::path::PathBuf;

use thiserror::Error;

use crate::document::DocumentError;
use crate::remote::RemoteApiError;
use crate::snapshots::{PersistenceError, SnapshotId};

/// Errors raised by configuration manager operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The live configuration file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No snapshot with this id.
    #[error("Snapshot {0} not found")]
    SnapshotNotFound(SnapshotId),

    /// Malformed document text.
    #[error(transparent)]
    Parse(#[from] DocumentError),

    /// The document failed semantic validation; nothing was written.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(ValidationError),

    /// Control-plane failure.
    #[error(transparent)]
    Remote(#[from] RemoteApiError),

    /// Snapshot store failure.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Filesystem failure other than a missing live file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;
