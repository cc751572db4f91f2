//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build client + manager → ConsoleRuntime
//!
//! Reload (startup.rs + signals.rs):
//!     SIGHUP or file change → Load config → new ConsoleRuntime → swap
//!
//! Shutdown (shutdown.rs + signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain requests → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast at startup: any error is fatal
//! - Reload failures keep the running runtime
//! - The configuration write lock and snapshot store outlive every runtime

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{wait_for_signal, ControlSignal};
pub use startup::{ConsoleRuntime, StartupError};
