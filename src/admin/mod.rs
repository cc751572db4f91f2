//! Admin API.
//!
//! # Responsibilities
//! - Authenticate operators with the configured bearer key
//! - Expose configuration, snapshot and virtual host operations over JSON
//! - Record an audit event for every mutation
//!
//! # Routes
//! - `GET  /admin/status`: console version, media server status, active snapshot
//! - `GET  /admin/config`: live `Server.xml` text and summary
//! - `PUT  /admin/config`: validate, snapshot, back up, write
//! - `GET  /admin/snapshots?limit=N`
//! - `POST /admin/snapshots/{id}/restore`
//! - `GET  /admin/vhosts`
//! - `PUT  /admin/vhosts/{name}`: replace one `VirtualHost` element
//! - `POST /admin/reload`: rebuild the runtime from the settings file

pub mod auth;
pub mod error;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub use auth::{Operator, DEFAULT_OPERATOR, X_OPERATOR};
pub use error::ApiError;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/config", get(get_config).put(put_config))
        .route("/admin/snapshots", get(list_snapshots))
        .route("/admin/snapshots/{id}/restore", post(restore_snapshot))
        .route("/admin/vhosts", get(get_vhosts))
        .route("/admin/vhosts/{name}", put(put_vhost))
        .route("/admin/reload", post(reload))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
