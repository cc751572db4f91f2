//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

/// A representative live configuration.
#[allow(dead_code)]
pub const SERVER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Server version="8">
    <Name>OvenMediaEngine</Name>
    <IP>*</IP>
    <StunServer>stun.l.google.com:19302</StunServer>
    <Bind>
        <Managers>
            <API><Port>8081</Port></API>
        </Managers>
        <Providers>
            <RTMP><Port>1935</Port></RTMP>
        </Providers>
    </Bind>
    <VirtualHosts>
        <VirtualHost>
            <Name>default</Name>
            <Host>
                <Names><Name>*</Name></Names>
            </Host>
        </VirtualHost>
    </VirtualHosts>
</Server>
"#;

/// A valid configuration whose `<Name>` identifies it.
#[allow(dead_code)]
pub fn server_xml_named(name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Server version="8">
    <Name>{name}</Name>
    <Bind><Providers><RTMP><Port>1935</Port></RTMP></Providers></Bind>
</Server>
"#
    )
}

/// Parses and has a version, but no `<Bind>`.
#[allow(dead_code)]
pub const NO_BIND_XML: &str = r#"<Server version="8"><Name>broken</Name></Server>"#;

/// A URL nothing listens on.
#[allow(dead_code)]
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    /// Serve `/v1/stats/current`; older servers answer 404.
    pub stats_available: bool,
    /// Reject requests whose `Authorization` header differs.
    pub required_auth: Option<String>,
    /// Hold every response this long before answering.
    pub delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Raw, still percent-encoded path.
    pub path: String,
    pub authorization: Option<String>,
}

struct MockState {
    options: MockOptions,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process stand-in for the media server REST API.
pub struct MockMediaServer {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockMediaServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

/// Start the mock on an ephemeral port.
pub async fn start_mock_media_server(options: MockOptions) -> MockMediaServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = Arc::new(MockState {
        options,
        requests: Mutex::new(Vec::new()),
    });
    let app = Router::new().fallback(handle).with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockMediaServer { addr, state }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        authorization: authorization.clone(),
    });

    if let Some(delay) = state.options.delay {
        tokio::time::sleep(delay).await;
    }

    if let Some(required) = &state.options.required_auth {
        if authorization.as_deref() != Some(required.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "statusCode": 401, "message": "Unauthorized" })),
            )
                .into_response();
        }
    }

    let ok = |response: serde_json::Value| {
        Json(json!({ "statusCode": 200, "message": "OK", "response": response })).into_response()
    };

    match (method.as_str(), uri.path()) {
        ("GET", "/v1/vhosts") => ok(json!(["default"])),
        ("GET", "/v1/vhosts/default") => ok(json!({ "name": "default" })),
        ("GET", "/v1/vhosts/default/apps") => ok(json!(["app"])),
        ("GET", "/v1/vhosts/default/apps/app") => {
            Json(json!({ "statusCode": 200, "message": "OK" })).into_response()
        }
        ("GET", "/v1/vhosts/default/apps/app/streams") => ok(json!(["my stream"])),
        ("GET", "/v1/vhosts/default/apps/app/streams/my%20stream") => {
            ok(json!({ "name": "my stream" }))
        }
        ("GET", "/v1/stats/current") if state.options.stats_available => {
            ok(json!({ "totalConnections": 3 }))
        }
        ("DELETE", "/v1/vhosts/default/apps/app") => StatusCode::OK.into_response(),
        ("DELETE", "/v1/vhosts/default") => StatusCode::ACCEPTED.into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "statusCode": 404, "message": "Could not find the resource" })),
        )
            .into_response(),
    }
}
