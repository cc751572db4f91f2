//! Runtime construction.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the control-plane client and configuration manager from it
//! - Rebuild both on reload while keeping the store and write lock
//!
//! # Design Decisions
//! - A runtime is immutable; reload builds a new one and the server swaps it
//! - Fail fast: any construction error is returned, nothing is half-built

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::{load_config, ConfigError, ConsoleConfig};
use crate::manager::ConfigManager;
use crate::remote::{MediaServerClient, RemoteApiError};
use crate::snapshots::SnapshotStore;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("media server client: {0}")]
    Remote(#[from] RemoteApiError),
}

/// Everything derived from one loaded [`ConsoleConfig`].
#[derive(Debug)]
pub struct ConsoleRuntime {
    pub config: Arc<ConsoleConfig>,
    pub manager: ConfigManager,
}

impl ConsoleRuntime {
    /// Build a runtime from an already validated config.
    pub fn build(
        config: ConsoleConfig,
        store: Arc<dyn SnapshotStore>,
        write_lock: Arc<Mutex<()>>,
    ) -> Result<Self, StartupError> {
        let client = MediaServerClient::from_config(&config.media_server)?;
        let manager = ConfigManager::new(&config.media_server.xml_path, store)
            .with_client(client)
            .with_write_lock(write_lock);

        tracing::info!(
            xml_path = %config.media_server.xml_path,
            api_url = %config.media_server.api_url,
            "Console runtime ready"
        );
        Ok(Self {
            config: Arc::new(config),
            manager,
        })
    }

    /// Load `path` and build a runtime from it.
    pub fn load(
        path: &Path,
        store: Arc<dyn SnapshotStore>,
        write_lock: Arc<Mutex<()>>,
    ) -> Result<Self, StartupError> {
        let config = load_config(path)?;
        Self::build(config, store, write_lock)
    }

    pub fn client(&self) -> Option<&MediaServerClient> {
        self.manager.client()
    }
}
