//! Configuration schema definitions.
//!
//! This module defines the console's own settings file. All types derive
//! Serde traits for deserialization from TOML; every section is defaulted so
//! an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the media console.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Admin API listener.
    pub listener: ListenerConfig,

    /// Managed media server: local config file and remote control plane.
    pub media_server: MediaServerConfig,

    /// Snapshot persistence.
    pub snapshots: SnapshotsConfig,

    /// Admin API authentication.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8090").
    pub bind_address: String,

    /// Per-request timeout for the admin API.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8090".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// The media server this console manages.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MediaServerConfig {
    /// Path to the live `Server.xml`.
    pub xml_path: String,

    /// Control-plane base URL (e.g., "http://localhost:8081").
    pub api_url: String,

    /// `user:password` for basic auth, or an opaque token sent as
    /// `Authorization: Basic <token>`. Empty disables authentication.
    pub access_token: String,

    /// Control-plane request timeout.
    pub timeout_secs: u64,
}

impl Default for MediaServerConfig {
    fn default() -> Self {
        Self {
            xml_path: "/opt/ovenmediaengine/bin/origin_conf/Server.xml".to_string(),
            api_url: "http://localhost:8081".to_string(),
            access_token: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Snapshot store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SnapshotsConfig {
    /// SQLite database file; created on first use.
    pub database_path: String,

    /// Default number of snapshots returned by listings.
    pub list_limit: usize,
}

impl Default for SnapshotsConfig {
    fn default() -> Self {
        Self {
            database_path: "media-console.db".to_string(),
            list_limit: 50,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Pretty for development, JSON for log aggregation.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ConsoleConfig = toml::from_str("").unwrap();
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.media_server.timeout_secs, 30);
        assert_eq!(config.snapshots.list_limit, 50);
    }

    #[test]
    fn test_partial_sections() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            [media_server]
            api_url = "http://ome.internal:8081"
            access_token = "ome:secret"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.media_server.api_url, "http://ome.internal:8081");
        assert_eq!(config.media_server.timeout_secs, 30);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }
}
