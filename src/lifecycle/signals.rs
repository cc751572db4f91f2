//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate signals to internal events
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers config reload, not shutdown

use std::io;

/// What the process was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Shutdown,
    Reload,
}

/// Wait for the next control signal.
#[cfg(unix)]
pub async fn wait_for_signal() -> io::Result<ControlSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = hangup.recv() => Ok(ControlSignal::Reload),
        _ = terminate.recv() => Ok(ControlSignal::Shutdown),
        result = tokio::signal::ctrl_c() => result.map(|_| ControlSignal::Shutdown),
    }
}

/// Wait for the next control signal.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> io::Result<ControlSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(ControlSignal::Shutdown)
}
