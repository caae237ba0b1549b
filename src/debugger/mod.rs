//! Debug action dispatch and active-line tracking.

mod active_line;

pub use active_line::{ActiveLine, ActiveLineIntent, ActiveLineReducer};

use crate::protocol::{ActionReply, DebugAction, Endpoint, LineId, FIELD_ACTION, FIELD_SESSION_ID};
use crate::session::{SessionController, SessionError};
use crate::view::{Notice, View};

/// Sends step/continue commands for the live session and moves the
/// active-line highlight to wherever the debugger stopped.
///
/// Each call issues exactly one request; there is no retry.
#[derive(Clone)]
pub struct DebugDispatcher {
    session: SessionController,
}

impl DebugDispatcher {
    pub fn new(session: SessionController) -> Self {
        Self { session }
    }

    /// Performs `action` and returns the new active line.
    ///
    /// `FAIL` and `DIED` clear the highlight and yield `None`. A reply
    /// naming a line the view does not have is reported and leaves the
    /// highlight where it was.
    ///
    /// # Errors
    /// `NotRunning` without a live session, `Transport` if the request
    /// failed, `UnknownLine` for an unknown line, and `Superseded` if the
    /// session ended before the reply arrived.
    pub async fn dispatch(&self, action: DebugAction) -> Result<Option<LineId>, SessionError> {
        let ticket = self.session.ticket().ok_or(SessionError::NotRunning)?;
        let handle = ticket.handle();
        let fields = [
            (FIELD_SESSION_ID, handle.form_value()),
            (FIELD_ACTION, action.tag().to_string()),
        ];

        tracing::debug!(session = %handle, %action, "Dispatching debugger action");

        let body = match self
            .session
            .client()
            .post(Endpoint::DebuggerAction, &fields)
            .await
        {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(session = %handle, %action, error = %err, "Debugger action failed");
                if self.session.is_current(ticket) {
                    self.session
                        .view()
                        .notify(self.session.connection_notice(&err, Endpoint::DebuggerAction));
                }
                return Err(err.into());
            }
        };

        let reply = ActionReply::parse(&body);
        let applied = self.session.with_current(ticket, |state, view| {
            if let ActionReply::Line(line) = &reply {
                if !view.has_line(line) {
                    tracing::warn!(session = %handle, %action, line = %line, "Debugger stopped on unknown line");
                    view.notify(Notice::UnknownLine(line.clone()));
                    return Err(SessionError::UnknownLine(line.clone()));
                }
            }

            active_line::apply(&mut state.active_line, ActiveLineIntent::Reply(reply), view);
            Ok(state.active_line.line().cloned())
        });

        match applied {
            Some(result) => {
                if let Ok(line) = &result {
                    tracing::debug!(session = %handle, %action, line = ?line, "Active line updated");
                }
                result
            }
            None => {
                tracing::debug!(session = %handle, %action, "Discarded reply for an ended session");
                Err(SessionError::Superseded)
            }
        }
    }
}

/// Clears the highlight when a session ends.
pub(crate) fn reset_active_line(state: &mut ActiveLine, view: &dyn View) {
    active_line::apply(state, ActiveLineIntent::Reset, view);
}
