//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ConsoleConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_XML_PATH: &str = "MEDIA_CONSOLE_XML_PATH";
pub const ENV_API_URL: &str = "MEDIA_CONSOLE_API_URL";
pub const ENV_API_TOKEN: &str = "MEDIA_CONSOLE_API_TOKEN";
pub const ENV_LOG_LEVEL: &str = "MEDIA_CONSOLE_LOG_LEVEL";
pub const ENV_DATABASE: &str = "MEDIA_CONSOLE_DATABASE";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, then apply
/// `MEDIA_CONSOLE_*` environment overrides.
pub fn load_config(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parse `content`, apply overrides from `lookup`, and validate.
pub fn parse_config(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConsoleConfig, ConfigError> {
    let mut config: ConsoleConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, lookup);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overwrite settings from environment-style variables.
pub fn apply_env_overrides(config: &mut ConsoleConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup(ENV_XML_PATH) {
        config.media_server.xml_path = v;
    }
    if let Some(v) = lookup(ENV_API_URL) {
        config.media_server.api_url = v;
    }
    if let Some(v) = lookup(ENV_API_TOKEN) {
        config.media_server.access_token = v;
    }
    if let Some(v) = lookup(ENV_LOG_LEVEL) {
        config.observability.log_level = v;
    }
    if let Some(v) = lookup(ENV_DATABASE) {
        config.snapshots.database_path = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_win() {
        let config = parse_config(
            "[media_server]\napi_url = \"http://file:8081\"\n",
            env(&[
                (ENV_API_URL, "http://env:8081"),
                (ENV_API_TOKEN, "ome:pw"),
                (ENV_DATABASE, "/var/lib/console.db"),
            ]),
        )
        .unwrap();

        assert_eq!(config.media_server.api_url, "http://env:8081");
        assert_eq!(config.media_server.access_token, "ome:pw");
        assert_eq!(config.snapshots.database_path, "/var/lib/console.db");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let result = parse_config("", env(&[(ENV_API_URL, "not a url")]));
        assert!(matches!(result, Err(ConfigError::Validation(ref errors)) if errors.len() == 1));
    }

    #[test]
    fn test_parse_error() {
        let result = parse_config("[listener\n", env(&[]));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.toml");
        fs::write(&path, "[snapshots]\nlist_limit = 10\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.snapshots.list_limit, 10);

        let missing = load_config(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
