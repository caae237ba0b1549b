use thiserror::Error;

use crate::protocol::{Endpoint, LineId};
use crate::transport::TransportError;

/// Errors returned by session operations.
///
/// Anything the user must see has already been reported through the view by
/// the time one of these is returned; callers only need it for control flow.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is live or being launched.
    #[error("A session is already running")]
    AlreadyRunning,

    /// The operation needs a live session.
    #[error("No session is running")]
    NotRunning,

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A 200 reply whose body is outside the endpoint's token grammar.
    #[error("Illegal response from '{endpoint}': {body:?}")]
    Protocol { endpoint: Endpoint, body: String },

    /// The debugger named a line the view does not have.
    #[error("Debugger reported unknown line '{0}'")]
    UnknownLine(LineId),

    /// The identifier does not name a breakpoint icon.
    #[error("Invalid breakpoint identifier '{0}'")]
    InvalidBreakpoint(String),

    /// The session ended while the request was in flight; its result was
    /// discarded.
    #[error("Session ended before the reply arrived")]
    Superseded,
}
