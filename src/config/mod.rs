//! Console settings subsystem.
//!
//! # Data Flow
//! ```text
//! console.toml
//!     → loader.rs (parse, deserialize, MEDIA_CONSOLE_* overrides)
//!     → validation.rs (semantic checks)
//!     → ConsoleConfig (validated, immutable)
//!     → lifecycle::ConsoleRuntime (client + manager built from it)
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new ConsoleRuntime swapped in atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - An invalid reload is logged and the running config stays

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, ConsoleConfig, ListenerConfig, LogFormat, MediaServerConfig, ObservabilityConfig,
    SnapshotsConfig,
};
pub use watcher::ConfigWatcher;
