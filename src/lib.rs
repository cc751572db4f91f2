//! Media server admin console.
//!
//! Manages the XML configuration of an OvenMediaEngine-style media server:
//! versioned snapshots, timestamped backups, validated writes and restores,
//! plus a thin client for the server's REST control plane.
//!
//! # Architecture Overview
//!
//! ```text
//!   console-cli ──▶ admin API (http + admin)
//!                        │
//!                        ▼
//!                 ConsoleRuntime (lifecycle)      ◀── config (TOML, watcher, SIGHUP)
//!                        │
//!          ┌─────────────┼──────────────┐
//!          ▼             ▼              ▼
//!      manager ──▶   document        remote ──▶ media server /v1 API
//!          │        (XML codec)
//!          ▼
//!      snapshots (SQLite)   audit   observability
//! ```

pub mod admin;
pub mod audit;
pub mod config;
pub mod document;
pub mod http;
pub mod lifecycle;
pub mod manager;
pub mod observability;
pub mod remote;
pub mod snapshots;

pub use config::ConsoleConfig;
pub use http::HttpServer;
pub use lifecycle::{ConsoleRuntime, Shutdown};
pub use manager::ConfigManager;
