use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::admin::auth::Operator;
use crate::admin::error::ApiError;
use crate::audit::{AuditAction, AuditEvent};
use crate::document::{self, ServerSummary};
use crate::http::server::AppState;
use crate::manager::{ApplyOutcome, ServerStatus};
use crate::snapshots::{ConfigurationSnapshot, SnapshotId};

const VHOST_ROOT: &str = "VirtualHost";

#[derive(Serialize)]
pub struct ConsoleStatus {
    pub version: &'static str,
    pub xml_path: String,
    pub media_server: ServerStatus,
    pub active_snapshot: Option<ConfigurationSnapshot>,
}

#[derive(Serialize)]
pub struct ConfigView {
    pub path: String,
    pub content: String,
    /// `None` when the live file does not parse.
    pub summary: Option<ServerSummary>,
}

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub content: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct VirtualHostView {
    pub name: Option<String>,
    pub xml: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<ConsoleStatus> {
    let runtime = state.runtime();
    let manager = &runtime.manager;

    let active_snapshot = manager.active_snapshot().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Active snapshot unavailable");
        None
    });

    Json(ConsoleStatus {
        version: env!("CARGO_PKG_VERSION"),
        xml_path: manager.xml_path().display().to_string(),
        media_server: manager.status().await,
        active_snapshot,
    })
}

pub async fn get_config(State(state): State<AppState>) -> Result<Json<ConfigView>, ApiError> {
    let runtime = state.runtime();
    let content = runtime.manager.read_raw()?;
    let summary = document::parse(&content)
        .ok()
        .map(|doc| document::extract_summary(&doc));

    Ok(Json(ConfigView {
        path: runtime.manager.xml_path().display().to_string(),
        content,
        summary,
    }))
}

pub async fn put_config(
    State(state): State<AppState>,
    Extension(Operator(operator)): Extension<Operator>,
    Json(request): Json<ApplyRequest>,
) -> Result<Json<ApplyOutcome>, ApiError> {
    let runtime = state.runtime();
    let description = request
        .description
        .unwrap_or_else(|| "Configuration update via admin API".to_string());

    let result = runtime
        .manager
        .apply_text(&request.content, &description, &operator)
        .await;

    state.audit.record(
        AuditEvent::new(&operator, AuditAction::Update, "server")
            .description(description)
            .outcome_of(&result),
    );
    Ok(Json(result?))
}

pub async fn list_snapshots(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ConfigurationSnapshot>>, ApiError> {
    let runtime = state.runtime();
    let limit = query.limit.unwrap_or(runtime.config.snapshots.list_limit);
    Ok(Json(runtime.manager.list_snapshots(limit)?))
}

pub async fn restore_snapshot(
    State(state): State<AppState>,
    Extension(Operator(operator)): Extension<Operator>,
    Path(id): Path<i64>,
) -> Result<Json<ConfigurationSnapshot>, ApiError> {
    let runtime = state.runtime();
    let result = runtime.manager.restore(SnapshotId(id)).await;

    state.audit.record(
        AuditEvent::new(&operator, AuditAction::Rollback, "snapshot")
            .resource_id(id.to_string())
            .outcome_of(&result),
    );
    Ok(Json(result?))
}

pub async fn get_vhosts(State(state): State<AppState>) -> Result<Json<Vec<VirtualHostView>>, ApiError> {
    let vhosts = state.runtime().manager.get_virtual_hosts()?;

    let views = vhosts
        .iter()
        .map(|vhost| {
            Ok(VirtualHostView {
                name: vhost.child_text("Name"),
                xml: document::serialize_element(vhost, true)?,
            })
        })
        .collect::<Result<Vec<_>, document::DocumentError>>()?;
    Ok(Json(views))
}

/// Body is the replacement `<VirtualHost>` element as XML.
pub async fn put_vhost(
    State(state): State<AppState>,
    Extension(Operator(operator)): Extension<Operator>,
    Path(name): Path<String>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let vhost = document::parse(&body)?.root;
    if vhost.name != VHOST_ROOT {
        return Err(ApiError::bad_request(format!(
            "expected <{}> element, got <{}>",
            VHOST_ROOT, vhost.name
        )));
    }

    let runtime = state.runtime();
    let result = runtime.manager.update_virtual_host(&name, vhost, &operator).await;

    let event = AuditEvent::new(&operator, AuditAction::Update, "vhost").resource_id(&name);
    match result {
        Ok(true) => {
            state.audit.record(event);
            Ok(Json(json!({ "updated": name })))
        }
        Ok(false) => Err(ApiError::not_found(format!("Virtual host '{}' not found", name))),
        Err(e) => {
            let result: Result<(), _> = Err(&e);
            state.audit.record(event.outcome_of(&result));
            Err(e.into())
        }
    }
}

pub async fn reload(
    State(state): State<AppState>,
    Extension(Operator(operator)): Extension<Operator>,
) -> Result<Json<Value>, ApiError> {
    let result = state.reload();

    state.audit.record(
        AuditEvent::new(&operator, AuditAction::Reload, "console").outcome_of(&result),
    );
    result?;
    Ok(Json(json!({ "reloaded": true })))
}
