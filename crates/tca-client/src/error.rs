//! Client error types
//!
//! Every failure reaching a caller is a [`ClientError`]. [`ClientError::kind`]
//! maps it onto the coarse taxonomy the composing layer renders.

use std::error::Error as StdError;

use reqwest::StatusCode;
use serde_json::Value;

/// Coarse error category used by callers to decide how to react
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection refused, network failure or timeout
    Transport,
    /// The backend rejected the bearer token (HTTP 401)
    Authentication,
    /// The backend rejected the request payload (HTTP 400/422)
    Validation,
    /// `success: false` or any other unsuccessful HTTP status
    LogicalFailure,
    /// Rejected locally before any request was sent
    InvalidInput,
    Unknown,
}

/// Error type for portal client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    #[error("request failed with status {status}: {payload}")]
    Http { status: u16, payload: Value },

    #[error("{0}")]
    LogicalFailure(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionRefused(_) | Self::Network(_) | Self::Timeout => ErrorKind::Transport,
            Self::Http { status: 401, .. } => ErrorKind::Authentication,
            Self::Http {
                status: 400 | 422, ..
            } => ErrorKind::Validation,
            Self::Http { .. } | Self::LogicalFailure(_) => ErrorKind::LogicalFailure,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Storage(_) | Self::Serialization(_) | Self::Config(_) | Self::Unknown(_) => {
                ErrorKind::Unknown
            }
        }
    }

    /// True when the backend rejected the session token. The session has
    /// already been cleared by the time a caller sees this.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Human-readable message, preferring the backend's own wording.
    pub fn message(&self) -> String {
        match self {
            Self::Http { payload, .. } => {
                payload_message(payload).unwrap_or_else(|| self.to_string())
            }
            _ => self.to_string(),
        }
    }

    /// Classify a transport-level failure from reqwest.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if err.is_connect() {
            if is_connection_refused(&err) {
                return Self::ConnectionRefused(err.to_string());
            }
            return Self::Network(err.to_string());
        }
        if err.is_request() || err.is_body() {
            return Self::Network(err.to_string());
        }
        if err.is_decode() {
            return Self::Unknown(format!("failed to decode response: {err}"));
        }
        Self::Unknown(err.to_string())
    }

    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let payload =
            serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()));
        Self::Http {
            status: status.as_u16(),
            payload,
        }
    }
}

/// Extract the `message` (or `error`) field of a backend JSON body.
pub(crate) fn payload_message(payload: &Value) -> Option<String> {
    match payload {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn is_connection_refused(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

/// Why a login attempt did not produce a session
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("server unreachable: {0}")]
    ServerUnreachable(String),

    #[error("login failed: {0}")]
    Other(String),
}

impl From<ClientError> for LoginError {
    fn from(err: ClientError) -> Self {
        match &err {
            ClientError::Http {
                status: 401 | 403, ..
            } => Self::InvalidCredentials(err.message()),
            e if e.is_transport() => Self::ServerUnreachable(err.message()),
            _ => Self::Other(err.message()),
        }
    }
}
