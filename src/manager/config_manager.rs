//! Configuration manager for the live `Server.xml`.
//!
//! # Responsibilities
//! - Read and parse the live configuration
//! - Gate every write on semantic validation
//! - Snapshot the pre-write content before overwriting it
//! - Copy the live file to a timestamped backup before each overwrite
//! - Restore a snapshot and mark it active
//! - Report control-plane connectivity without failing

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::document::{self, Document, DocumentError, Element, ServerSummary};
use crate::manager::fs::{ConfigFs, LocalFs};
use crate::manager::validate::{validate_document, ValidationError};
use crate::manager::{ManagerError, ManagerResult};
use crate::observability::metrics;
use crate::remote::MediaServerClient;
use crate::snapshots::{ConfigurationSnapshot, ConfigurationType, NewSnapshot, SnapshotId, SnapshotStore};

/// `strftime` pattern appended to backup file names.
///
/// Second resolution: two backups taken within the same second share a name
/// and the later copy replaces the earlier one.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Result of a live configuration write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub backup_path: Option<PathBuf>,
}

/// Result of a validated, snapshotted configuration change.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    /// Snapshot of the previous content; `None` when there was no live file.
    pub snapshot: Option<ConfigurationSnapshot>,
    pub backup_path: Option<PathBuf>,
}

/// Control-plane reachability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub error: Option<String>,
}

/// Aggregated media server status for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub api_connected: bool,
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
}

/// Owns the workflow around one live configuration file.
pub struct ConfigManager {
    xml_path: PathBuf,
    fs: Arc<dyn ConfigFs>,
    store: Arc<dyn SnapshotStore>,
    client: Option<MediaServerClient>,
    write_lock: Arc<Mutex<()>>,
}

impl ConfigManager {
    /// Manage `xml_path` on the local filesystem, recording snapshots in `store`.
    pub fn new(xml_path: impl Into<PathBuf>, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            xml_path: xml_path.into(),
            fs: Arc::new(LocalFs),
            store,
            client: None,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn ConfigFs>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_client(mut self, client: MediaServerClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Share the mutation lock with another manager of the same file.
    ///
    /// Runtime reloads build a new manager; passing the old lock keeps writes
    /// serialized across the swap.
    pub fn with_write_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.write_lock = lock;
        self
    }

    pub fn write_lock(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.write_lock)
    }

    pub fn xml_path(&self) -> &Path {
        &self.xml_path
    }

    pub fn client(&self) -> Option<&MediaServerClient> {
        self.client.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Live configuration text, unparsed.
    pub fn read_raw(&self) -> ManagerResult<String> {
        self.fs.read_to_string(&self.xml_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ManagerError::NotFound(self.xml_path.clone()),
            io::ErrorKind::InvalidData => {
                ManagerError::Parse(DocumentError::Parse(format!("invalid encoding: {}", e)))
            }
            _ => ManagerError::Io {
                path: self.xml_path.clone(),
                source: e,
            },
        })
    }

    /// Parse the live configuration.
    pub fn read(&self) -> ManagerResult<Document> {
        let text = self.read_raw()?;
        Ok(document::parse(&text)?)
    }

    /// Semantic check; never an error path on its own.
    pub fn validate(&self, doc: &Document) -> Result<(), ValidationError> {
        validate_document(doc)
    }

    /// Overwrite the live configuration, optionally backing it up first.
    pub async fn write(&self, doc: &Document, backup: bool) -> ManagerResult<WriteOutcome> {
        let _guard = self.write_lock.lock().await;
        self.write_locked(doc, backup)
    }

    /// Save `doc` as the next snapshot version.
    pub async fn create_snapshot_record(
        &self,
        doc: &Document,
        description: &str,
        user: &str,
    ) -> ManagerResult<ConfigurationSnapshot> {
        let data = document::serialize(doc, true)?;
        let _guard = self.write_lock.lock().await;
        self.record_snapshot(data, description, user)
    }

    /// Validate `doc`, snapshot the current content, then write `doc`.
    ///
    /// A write failure after the snapshot leaves the snapshot in place.
    pub async fn apply(&self, doc: &Document, description: &str, user: &str) -> ManagerResult<ApplyOutcome> {
        if let Err(e) = self.validate(doc) {
            tracing::warn!(error = %e, user, "Rejected invalid configuration");
            return Err(ManagerError::InvalidConfiguration(e));
        }

        let _guard = self.write_lock.lock().await;

        let snapshot = match self.read_raw() {
            Ok(current) => Some(self.record_snapshot(current, description, user)?),
            Err(ManagerError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let outcome = self.write_locked(doc, true)?;
        Ok(ApplyOutcome {
            snapshot,
            backup_path: outcome.backup_path,
        })
    }

    /// Parse `text` and [`apply`](Self::apply) it.
    pub async fn apply_text(&self, text: &str, description: &str, user: &str) -> ManagerResult<ApplyOutcome> {
        let doc = document::parse(text)?;
        self.apply(&doc, description, user).await
    }

    /// Write a stored snapshot back to the live file and mark it active.
    pub async fn restore(&self, id: SnapshotId) -> ManagerResult<ConfigurationSnapshot> {
        let snapshot = self
            .store
            .get(id)?
            .ok_or(ManagerError::SnapshotNotFound(id))?;

        let doc = document::parse(&snapshot.configuration_data)?;
        if let Err(e) = self.validate(&doc) {
            tracing::warn!(snapshot_id = id.0, error = %e, "Refusing to restore invalid snapshot");
            return Err(ManagerError::InvalidConfiguration(e));
        }

        let _guard = self.write_lock.lock().await;
        self.write_locked(&doc, true)?;
        self.store.activate(id)?;

        tracing::info!(
            snapshot_id = id.0,
            version = snapshot.version,
            "Configuration restored from snapshot"
        );
        Ok(ConfigurationSnapshot {
            is_active: true,
            ..snapshot
        })
    }

    /// Display summary of the live configuration.
    pub fn get_server_info(&self) -> ManagerResult<ServerSummary> {
        Ok(document::extract_summary(&self.read()?))
    }

    /// Every `VirtualHost` element, in file order.
    pub fn get_virtual_hosts(&self) -> ManagerResult<Vec<Element>> {
        let doc = self.read()?;
        Ok(doc
            .root
            .child("VirtualHosts")
            .map(|list| list.children_named("VirtualHost").cloned().collect())
            .unwrap_or_default())
    }

    /// Replace the virtual host whose `<Name>` is `name`.
    ///
    /// The pre-edit file is snapshotted first, attributed to `user`. Returns
    /// `false` without writing or snapshotting when no such host exists.
    pub async fn update_virtual_host(&self, name: &str, vhost: Element, user: &str) -> ManagerResult<bool> {
        let _guard = self.write_lock.lock().await;
        let current = self.read_raw()?;
        let mut doc = document::parse(&current)?;

        let target = doc.root.child_mut("VirtualHosts").and_then(|list| {
            list.children_named_mut("VirtualHost")
                .find(|v| v.child_text("Name").as_deref() == Some(name))
        });
        match target {
            Some(slot) => *slot = vhost,
            None => {
                tracing::debug!(vhost = name, "Virtual host not found, nothing to update");
                return Ok(false);
            }
        }

        self.record_snapshot(current, &format!("Update virtual host '{}'", name), user)?;
        self.write_locked(&doc, true)?;
        tracing::info!(vhost = name, user, "Virtual host updated");
        Ok(true)
    }

    pub fn list_snapshots(&self, limit: usize) -> ManagerResult<Vec<ConfigurationSnapshot>> {
        Ok(self.store.list(limit)?)
    }

    pub fn active_snapshot(&self) -> ManagerResult<Option<ConfigurationSnapshot>> {
        Ok(self.store.active()?)
    }

    /// Probe the control plane.
    pub async fn test_remote_connection(&self) -> ConnectionStatus {
        let Some(client) = &self.client else {
            return ConnectionStatus {
                connected: false,
                error: Some("Media server client not configured".to_string()),
            };
        };
        if client.health_check().await {
            ConnectionStatus {
                connected: true,
                error: None,
            }
        } else {
            ConnectionStatus {
                connected: false,
                error: Some("Media server API is not responding".to_string()),
            }
        }
    }

    /// Connectivity plus live stats; failures land in `error`.
    pub async fn status(&self) -> ServerStatus {
        let connection = self.test_remote_connection().await;
        let mut status = ServerStatus {
            api_connected: connection.connected,
            api_url: self.client.as_ref().map(|c| c.api_url().to_string()),
            error: connection.error,
            stats: None,
        };

        if let (true, Some(client)) = (status.api_connected, &self.client) {
            match client.fetch_server_stats().await {
                Ok(stats) => status.stats = Some(stats),
                Err(e) => {
                    tracing::warn!(error = %e, "Server stats unavailable");
                    status.error = Some(format!("Stats unavailable: {}", e));
                }
            }
        }
        status
    }

    fn record_snapshot(&self, data: String, description: &str, user: &str) -> ManagerResult<ConfigurationSnapshot> {
        let version = self.store.latest_version()? + 1;
        let snapshot = self.store.save(NewSnapshot {
            version,
            description: description.to_string(),
            configuration_type: ConfigurationType::ServerXml,
            configuration_data: data,
            user_id: user.to_string(),
            created_at: Utc::now(),
        })?;

        metrics::record_snapshot_created();
        tracing::info!(
            snapshot_id = snapshot.id.0,
            version,
            user,
            "Configuration snapshot created"
        );
        Ok(snapshot)
    }

    /// Caller must hold `write_lock`.
    fn write_locked(&self, doc: &Document, backup: bool) -> ManagerResult<WriteOutcome> {
        let text = document::serialize(doc, true)?;

        let backup_path = if backup && self.fs.exists(&self.xml_path) {
            let path = backup_path_for(&self.xml_path, Local::now());
            self.fs
                .copy(&self.xml_path, &path)
                .map_err(|source| ManagerError::Io {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!(backup = %path.display(), "Created backup");
            Some(path)
        } else {
            None
        };

        if let Err(source) = self.fs.write(&self.xml_path, &text) {
            metrics::record_config_write("error");
            tracing::error!(
                path = %self.xml_path.display(),
                error = %source,
                "Error writing configuration"
            );
            return Err(ManagerError::Io {
                path: self.xml_path.clone(),
                source,
            });
        }

        metrics::record_config_write("ok");
        tracing::info!(
            path = %self.xml_path.display(),
            bytes = text.len(),
            "Configuration written"
        );
        Ok(WriteOutcome { backup_path })
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("xml_path", &self.xml_path)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

/// Backup location for `path` taken at `now`: `<path>.backup.<YYYYmmdd_HHMMSS>`.
pub fn backup_path_for(path: &Path, now: DateTime<Local>) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup.{}", now.format(BACKUP_TIMESTAMP_FORMAT)));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_backup_path_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let path = backup_path_for(Path::new("/etc/ome/Server.xml"), now);
        assert_eq!(path, PathBuf::from("/etc/ome/Server.xml.backup.20240309_070501"));
    }
}
