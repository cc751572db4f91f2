//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the admin handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener with graceful shutdown
//! - Hold the swappable runtime shared by every handler

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{body::Body, http::Request, Router};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::audit::AuditSink;
use crate::config::ConsoleConfig;
use crate::http::request::{propagate_request_id, set_request_id, RequestIdExt};
use crate::lifecycle::{ConsoleRuntime, StartupError};
use crate::snapshots::SnapshotStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Current runtime; replaced wholesale on reload.
    pub inner: Arc<ArcSwap<ConsoleRuntime>>,
    pub store: Arc<dyn SnapshotStore>,
    pub write_lock: Arc<Mutex<()>>,
    pub audit: Arc<dyn AuditSink>,
    /// Settings file re-read on reload; `None` rebuilds from the current config.
    pub config_path: Option<PathBuf>,
}

impl AppState {
    /// The snapshot store and write lock are taken from `runtime`, so every
    /// rebuilt runtime shares them.
    pub fn new(runtime: ConsoleRuntime, audit: Arc<dyn AuditSink>) -> Self {
        let store = runtime.manager.store().clone();
        let write_lock = runtime.manager.write_lock();
        Self {
            inner: Arc::new(ArcSwap::from_pointee(runtime)),
            store,
            write_lock,
            audit,
            config_path: None,
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn runtime(&self) -> Arc<ConsoleRuntime> {
        self.inner.load_full()
    }

    /// Rebuild the runtime from `config` and swap it in.
    pub fn apply_config(&self, config: ConsoleConfig) -> Result<(), StartupError> {
        let runtime = ConsoleRuntime::build(config, self.store.clone(), self.write_lock.clone())?;
        self.inner.store(Arc::new(runtime));
        tracing::info!("Console runtime swapped");
        Ok(())
    }

    /// Reload from the settings file; on error the current runtime stays.
    pub fn reload(&self) -> Result<(), StartupError> {
        let runtime = match &self.config_path {
            Some(path) => ConsoleRuntime::load(path, self.store.clone(), self.write_lock.clone())?,
            None => ConsoleRuntime::build(
                self.runtime().config.as_ref().clone(),
                self.store.clone(),
                self.write_lock.clone(),
            )?,
        };
        self.inner.store(Arc::new(runtime));
        tracing::info!(path = ?self.config_path, "Console runtime reloaded");
        Ok(())
    }
}

/// HTTP server for the admin API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let timeout = Duration::from_secs(state.runtime().config.listener.request_timeout_secs);

        setup_admin_router(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(propagate_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "admin_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request.headers().request_id().unwrap_or("-"),
                )
            }))
            .layer(set_request_id())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Admin API listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
