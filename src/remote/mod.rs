//! Media server control-plane client.
//!
//! # Data Flow
//! ```text
//! caller (manager, admin handlers)
//!     → client.rs (scoped path, auth, timeout)
//!     → media server REST API (/v1/vhosts/...)
//!     → {"response": ...} envelope unwrapped
//!     → types.rs (RemoteApiError on any failure)
//! ```
//!
//! # Design Decisions
//! - One error type for transport, timeout and non-2xx failures
//! - Authentication is chosen once at construction
//! - Stats and health degrade to empty/false instead of failing
//! - No retries: a failed call surfaces immediately

pub mod client;
pub mod types;

pub use client::MediaServerClient;
pub use types::{RemoteApiError, RemoteAuth, RemoteResult};
