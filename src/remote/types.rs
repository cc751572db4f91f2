//! Control-plane error and authentication types.

use thiserror::Error;

/// Errors returned by the media server client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be sent or the connection failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// No response within the configured timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The response body was not the JSON shape we expect.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The configured API URL or credentials cannot be used.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl RemoteApiError {
    /// HTTP status carried by the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for control-plane calls.
pub type RemoteResult<T> = Result<T, RemoteApiError>;

/// How requests authenticate against the control plane.
#[derive(Clone, PartialEq, Eq)]
pub enum RemoteAuth {
    /// No credentials.
    None,
    /// HTTP basic credentials.
    Basic { username: String, password: String },
    /// Pre-encoded value sent as `Authorization: Basic <token>`.
    Header(String),
}

impl RemoteAuth {
    /// Derive the scheme from an access token.
    ///
    /// `user:password` becomes basic credentials (split at the first colon);
    /// any other non-empty token is passed through as the header value.
    pub fn from_access_token(token: &str) -> Self {
        if token.is_empty() {
            return RemoteAuth::None;
        }
        match token.split_once(':') {
            Some((username, password)) => RemoteAuth::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            None => RemoteAuth::Header(format!("Basic {}", token)),
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            RemoteAuth::None => "none",
            RemoteAuth::Basic { .. } => "basic",
            RemoteAuth::Header(_) => "header",
        }
    }
}

impl std::fmt::Debug for RemoteAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteAuth::None => f.write_str("None"),
            RemoteAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            RemoteAuth::Header(_) => f.debug_tuple("Header").field(&"***").finish(),
        }
    }
}
