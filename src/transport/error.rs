//! Error types for server round trips.

use thiserror::Error;

use crate::protocol::Endpoint;

/// Errors that can occur while talking to the session server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The configured server URL is unusable
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request never produced a response
    #[error("Connection to '{endpoint}' failed: {source}")]
    Connection {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the client-side timeout
    #[error("Request to '{endpoint}' timed out after {duration_ms}ms")]
    Timeout { endpoint: Endpoint, duration_ms: u64 },

    /// The server answered with a non-200 status
    #[error("'{endpoint}' answered {status}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    /// The response body could not be read
    #[error("Failed to read '{endpoint}' response: {source}")]
    Body {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// HTTP status reported by the server, if a response arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body of a non-200 reply.
    pub fn body(&self) -> Option<&str> {
        match self {
            TransportError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Short machine-readable kind, used as a log field.
    pub fn error_type(&self) -> &'static str {
        match self {
            TransportError::Client(_) => "client_error",
            TransportError::InvalidUrl { .. } => "invalid_url",
            TransportError::Connection { .. } => "connection_error",
            TransportError::Timeout { .. } => "request_timeout",
            TransportError::Status { .. } => "status_error",
            TransportError::Body { .. } => "body_error",
        }
    }
}
