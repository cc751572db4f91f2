//! Snapshot records and persistence errors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned snapshot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub i64);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SnapshotId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Which configuration artifact a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationType {
    #[default]
    ServerXml,
    Vhost,
    Application,
}

impl ConfigurationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigurationType::ServerXml => "server_xml",
            ConfigurationType::Vhost => "vhost",
            ConfigurationType::Application => "application",
        }
    }
}

impl fmt::Display for ConfigurationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigurationType {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server_xml" => Ok(ConfigurationType::ServerXml),
            "vhost" => Ok(ConfigurationType::Vhost),
            "application" => Ok(ConfigurationType::Application),
            other => Err(PersistenceError::Corrupt(format!(
                "unknown configuration type '{}'",
                other
            ))),
        }
    }
}

/// A snapshot before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnapshot {
    pub version: i64,
    pub description: String,
    pub configuration_type: ConfigurationType,
    pub configuration_data: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted copy of the configuration at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    pub id: SnapshotId,
    pub version: i64,
    pub description: String,
    pub configuration_type: ConfigurationType,
    /// Full document text. Omitted from listings.
    #[serde(skip_serializing, default)]
    pub configuration_data: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl ConfigurationSnapshot {
    /// Attach a store id to a new snapshot. New snapshots start inactive.
    pub fn from_new(id: SnapshotId, new: NewSnapshot) -> Self {
        Self {
            id,
            version: new.version,
            description: new.description,
            configuration_type: new.configuration_type,
            configuration_data: new.configuration_data,
            user_id: new.user_id,
            created_at: new.created_at,
            is_active: false,
        }
    }
}

/// Errors raised by snapshot stores.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// No snapshot with this id.
    #[error("Snapshot {0} not found")]
    NotFound(SnapshotId),

    /// Stored data could not be decoded.
    #[error("Corrupt snapshot record: {0}")]
    Corrupt(String),

    /// Database failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store lock was poisoned by a panicking writer.
    #[error("Snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for snapshot store operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;
