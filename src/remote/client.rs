//! HTTP client for the media server management API.
//!
//! # Responsibilities
//! - Build scoped resource paths (vhost → app → stream)
//! - Authenticate every request the same way
//! - Bound every call by the configured timeout
//! - Normalize transport and protocol failures into [`RemoteApiError`]

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

use crate::config::schema::MediaServerConfig;
use crate::observability::metrics;
use crate::remote::types::{RemoteApiError, RemoteAuth, RemoteResult};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the media server REST API.
#[derive(Clone)]
pub struct MediaServerClient {
    http: reqwest::Client,
    base_url: Url,
    auth: RemoteAuth,
    timeout: Duration,
}

impl MediaServerClient {
    /// Create a client for `api_url` (e.g. `http://localhost:8081`).
    pub fn new(api_url: &str, access_token: &str, timeout: Duration) -> RemoteResult<Self> {
        let base_url = Url::parse(api_url.trim_end_matches('/')).map_err(|e| {
            RemoteApiError::InvalidConfig(format!("invalid API URL '{}': {}", api_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteApiError::InvalidConfig(format!(
                "API URL '{}' cannot carry a path",
                api_url
            )));
        }

        let auth = RemoteAuth::from_access_token(access_token);
        let mut headers = HeaderMap::new();
        if let RemoteAuth::Header(value) = &auth {
            let mut value = HeaderValue::from_str(value).map_err(|e| {
                RemoteApiError::InvalidConfig(format!("access token is not a valid header: {}", e))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| RemoteApiError::InvalidConfig(e.to_string()))?;

        tracing::debug!(
            api_url = %base_url,
            auth = auth.scheme(),
            timeout_secs = timeout.as_secs(),
            "Media server client created"
        );

        Ok(Self {
            http,
            base_url,
            auth,
            timeout,
        })
    }

    /// Create a client from the `[media_server]` settings.
    pub fn from_config(config: &MediaServerConfig) -> RemoteResult<Self> {
        Self::new(
            &config.api_url,
            &config.access_token,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Base URL the client talks to.
    pub fn api_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn auth(&self) -> &RemoteAuth {
        &self.auth
    }

    // Virtual hosts

    pub async fn list_vhosts(&self) -> RemoteResult<Vec<Value>> {
        self.list(&["v1", "vhosts"]).await
    }

    pub async fn get_vhost(&self, vhost: &str) -> RemoteResult<Value> {
        self.object(Method::GET, &["v1", "vhosts", vhost], None).await
    }

    pub async fn create_vhost(&self, config: &Value) -> RemoteResult<Value> {
        self.object(Method::POST, &["v1", "vhosts"], Some(config)).await
    }

    pub async fn update_vhost(&self, vhost: &str, config: &Value) -> RemoteResult<Value> {
        self.object(Method::PUT, &["v1", "vhosts", vhost], Some(config)).await
    }

    pub async fn delete_vhost(&self, vhost: &str) -> RemoteResult<bool> {
        self.delete(&["v1", "vhosts", vhost]).await
    }

    // Applications

    pub async fn list_apps(&self, vhost: &str) -> RemoteResult<Vec<Value>> {
        self.list(&["v1", "vhosts", vhost, "apps"]).await
    }

    pub async fn get_app(&self, vhost: &str, app: &str) -> RemoteResult<Value> {
        self.object(Method::GET, &["v1", "vhosts", vhost, "apps", app], None)
            .await
    }

    pub async fn create_app(&self, vhost: &str, config: &Value) -> RemoteResult<Value> {
        self.object(Method::POST, &["v1", "vhosts", vhost, "apps"], Some(config))
            .await
    }

    pub async fn update_app(&self, vhost: &str, app: &str, config: &Value) -> RemoteResult<Value> {
        self.object(Method::PUT, &["v1", "vhosts", vhost, "apps", app], Some(config))
            .await
    }

    pub async fn delete_app(&self, vhost: &str, app: &str) -> RemoteResult<bool> {
        self.delete(&["v1", "vhosts", vhost, "apps", app]).await
    }

    // Streams

    pub async fn list_streams(&self, vhost: &str, app: &str) -> RemoteResult<Vec<Value>> {
        self.list(&["v1", "vhosts", vhost, "apps", app, "streams"]).await
    }

    pub async fn get_stream(&self, vhost: &str, app: &str, stream: &str) -> RemoteResult<Value> {
        self.object(
            Method::GET,
            &["v1", "vhosts", vhost, "apps", app, "streams", stream],
            None,
        )
        .await
    }

    /// Create a stream (push publishing).
    pub async fn create_stream(&self, vhost: &str, app: &str, config: &Value) -> RemoteResult<Value> {
        self.object(
            Method::POST,
            &["v1", "vhosts", vhost, "apps", app, "streams"],
            Some(config),
        )
        .await
    }

    pub async fn delete_stream(&self, vhost: &str, app: &str, stream: &str) -> RemoteResult<bool> {
        self.delete(&["v1", "vhosts", vhost, "apps", app, "streams", stream])
            .await
    }

    // Statistics

    /// Current server statistics, failing on any error.
    pub async fn fetch_server_stats(&self) -> RemoteResult<Value> {
        self.object(Method::GET, &["v1", "stats", "current"], None).await
    }

    /// Current server statistics, or an empty object when unavailable.
    ///
    /// Older media server builds do not expose the stats endpoint.
    pub async fn get_server_stats(&self) -> Value {
        match self.fetch_server_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "Server stats unavailable");
                empty_object()
            }
        }
    }

    /// Statistics for one stream, or an empty object when unavailable.
    pub async fn get_stream_stats(&self, vhost: &str, app: &str, stream: &str) -> Value {
        let path = [
            "v1", "stats", "current", "vhosts", vhost, "apps", app, "streams", stream,
        ];
        match self.object(Method::GET, &path, None).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(vhost, app, stream, error = %e, "Stream stats unavailable");
                empty_object()
            }
        }
    }

    /// Check if the management API is reachable.
    pub async fn health_check(&self) -> bool {
        let healthy = self.request(Method::GET, &["v1", "vhosts"], None).await.is_ok();
        metrics::record_remote_health(healthy);
        healthy
    }

    async fn list(&self, segments: &[&str]) -> RemoteResult<Vec<Value>> {
        match self.fetch(Method::GET, segments, None).await? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(RemoteApiError::InvalidResponse(format!(
                "expected a list, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn object(&self, method: Method, segments: &[&str], body: Option<&Value>) -> RemoteResult<Value> {
        Ok(match self.fetch(method, segments, body).await? {
            None | Some(Value::Null) => empty_object(),
            Some(value) => value,
        })
    }

    async fn delete(&self, segments: &[&str]) -> RemoteResult<bool> {
        let response = self.request(Method::DELETE, segments, None).await?;
        Ok(response.status() == reqwest::StatusCode::OK)
    }

    /// Issue a request and unwrap the `response` member of the envelope.
    async fn fetch(&self, method: Method, segments: &[&str], body: Option<&Value>) -> RemoteResult<Option<Value>> {
        let response = self.request(method, segments, body).await?;
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| RemoteApiError::InvalidResponse(e.to_string()))?;
        Ok(match payload {
            Value::Object(mut map) => map.remove("response"),
            _ => None,
        })
    }

    async fn request(&self, method: Method, segments: &[&str], body: Option<&Value>) -> RemoteResult<reqwest::Response> {
        let url = self.endpoint(segments)?;
        let start = Instant::now();

        let mut request = self.http.request(method.clone(), url.clone());
        if let RemoteAuth::Basic { username, password } = &self.auth {
            request = request.basic_auth(username, Some(password));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_remote_request(method.as_str(), "transport_error", start);
                let err = self.transport_error(e);
                tracing::error!(method = %method, url = %url, error = %err, "Media server API connection error");
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            metrics::record_remote_request(method.as_str(), "http_error", start);
            tracing::error!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                "Media server API error"
            );
            return Err(RemoteApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        metrics::record_remote_request(method.as_str(), "ok", start);
        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "Media server API call");
        Ok(response)
    }

    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteApiError::InvalidConfig("API URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error) -> RemoteApiError {
        if err.is_timeout() {
            RemoteApiError::Timeout(self.timeout.as_secs())
        } else {
            RemoteApiError::Connection(err.to_string())
        }
    }
}

impl std::fmt::Debug for MediaServerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaServerClient")
            .field("api_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .field("timeout_secs", &self.timeout.as_secs())
            .finish()
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
