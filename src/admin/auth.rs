use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;
use crate::observability::metrics;

pub const X_OPERATOR: &str = "x-operator";
pub const DEFAULT_OPERATOR: &str = "admin";

/// Who is making the change; recorded on snapshots and audit events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(pub String);

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let expected = format!("Bearer {}", state.runtime().config.admin.api_key);

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|value| value == expected);

    if !authorized {
        tracing::warn!(method = %method, uri = %request.uri(), "Rejected unauthenticated admin request");
        metrics::record_admin_request(method.as_str(), StatusCode::UNAUTHORIZED.as_u16());
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let operator = request
        .headers()
        .get(X_OPERATOR)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_OPERATOR)
        .to_string();
    request.extensions_mut().insert(Operator(operator));

    let response = next.run(request).await;
    metrics::record_admin_request(method.as_str(), response.status().as_u16());
    response
}
