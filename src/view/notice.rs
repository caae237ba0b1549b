use std::fmt;

use crate::protocol::{Endpoint, LineId};
use crate::transport::TransportError;

/// A user-visible alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Transport failure. `status` is `None` when no response arrived.
    ConnectionError {
        endpoint: Endpoint,
        status: Option<u16>,
        /// Server body, only present when debug detail is enabled.
        detail: Option<String>,
    },
    /// A 200 reply that does not parse.
    IllegalResponse { endpoint: Endpoint, body: String },
    /// Error text returned by `stop`.
    StopFailed(String),
    /// The session exceeded its execution time budget.
    Timeout,
    /// The debugger named a line that is not on the page.
    UnknownLine(LineId),
}

impl Notice {
    pub fn connection_error(error: &TransportError, endpoint: Endpoint, show_detail: bool) -> Self {
        let detail = show_detail.then(|| match error.body() {
            Some(body) if !body.is_empty() => body.to_string(),
            _ => error.to_string(),
        });

        Notice::ConnectionError {
            endpoint,
            status: error.status(),
            detail,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ConnectionError {
                status, detail, ..
            } => {
                match status {
                    Some(status) => write!(f, "connection error {}", status)?,
                    None => write!(f, "connection error")?,
                }
                if let Some(detail) = detail {
                    write!(f, ": {}", detail)?;
                }
                Ok(())
            }
            Notice::IllegalResponse { .. } => write!(f, "illegal response from server"),
            Notice::StopFailed(text) => write!(f, "{}", text),
            Notice::Timeout => write!(f, "Timeout"),
            Notice::UnknownLine(line) => write!(f, "debugger stopped on unknown line '{}'", line),
        }
    }
}
