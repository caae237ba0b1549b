//! Breakpoint toggling.
//!
//! The server owns the breakpoint set. The client only shows an icon per
//! line, and the icon is also the state a toggle reads. Setting and
//! removing are asymmetric and live in separate code paths.

use crate::protocol::{
    BreakpointId, Endpoint, SetBreakpointReply, FIELD_LINE_NO, FIELD_SESSION_ID,
};
use crate::session::{SessionController, SessionError, SessionTicket};
use crate::view::Icon;

#[derive(Clone)]
pub struct BreakpointManager {
    session: SessionController,
}

impl BreakpointManager {
    pub fn new(session: SessionController) -> Self {
        Self { session }
    }

    /// Toggles the breakpoint behind icon `id` and returns the icon now
    /// displayed.
    ///
    /// Network failures are logged and never reported to the user.
    ///
    /// # Errors
    /// `NotRunning` without a live session, `InvalidBreakpoint` if `id`
    /// names no icon, and `Superseded` if the session ended before a set
    /// was acknowledged.
    pub async fn toggle_breakpoint(&self, id: &BreakpointId) -> Result<Icon, SessionError> {
        let ticket = self.session.ticket().ok_or(SessionError::NotRunning)?;
        let invalid = || SessionError::InvalidBreakpoint(id.to_string());
        let line_no = id.line_number().ok_or_else(invalid)?;
        let displayed = self.session.view().breakpoint_icon(id).ok_or_else(invalid)?;

        match displayed {
            Icon::NoBreakpoint => self.set_confirmed(ticket, id, line_no).await,
            Icon::Breakpoint => Ok(self.remove_optimistic(ticket, id, line_no).await),
        }
    }

    /// Confirmed path: the icon shows a breakpoint only after an explicit
    /// `OK` for the session that is still live.
    async fn set_confirmed(
        &self,
        ticket: SessionTicket,
        id: &BreakpointId,
        line_no: u32,
    ) -> Result<Icon, SessionError> {
        let handle = ticket.handle();
        let reply = match self
            .session
            .client()
            .post(Endpoint::SetBreakpoint, &fields(ticket, line_no))
            .await
        {
            Ok(body) => SetBreakpointReply::parse(&body),
            Err(err) => {
                tracing::warn!(session = %handle, line = line_no, error = %err, "Set breakpoint failed");
                return Ok(Icon::NoBreakpoint);
            }
        };

        match reply {
            SetBreakpointReply::Ok => {
                let applied = self.session.with_current(ticket, |_, view| {
                    view.set_breakpoint_icon(id, Icon::Breakpoint);
                });
                if applied.is_none() {
                    tracing::debug!(session = %handle, line = line_no, "Discarded breakpoint ack for an ended session");
                    return Err(SessionError::Superseded);
                }
                tracing::debug!(session = %handle, line = line_no, "Breakpoint set");
                Ok(Icon::Breakpoint)
            }
            SetBreakpointReply::Refused(body) => {
                tracing::info!(session = %handle, line = line_no, reply = %body, "Server refused breakpoint");
                Ok(Icon::NoBreakpoint)
            }
        }
    }

    /// Optimistic path: the icon is cleared before the request goes out and
    /// the reply is ignored.
    async fn remove_optimistic(&self, ticket: SessionTicket, id: &BreakpointId, line_no: u32) -> Icon {
        let handle = ticket.handle();
        self.session.view().set_breakpoint_icon(id, Icon::NoBreakpoint);

        if let Err(err) = self
            .session
            .client()
            .post(Endpoint::RemoveBreakpoint, &fields(ticket, line_no))
            .await
        {
            tracing::warn!(session = %handle, line = line_no, error = %err, "Remove breakpoint failed");
        } else {
            tracing::debug!(session = %handle, line = line_no, "Breakpoint removed");
        }
        Icon::NoBreakpoint
    }
}

fn fields(ticket: SessionTicket, line_no: u32) -> [(&'static str, String); 2] {
    [
        (FIELD_SESSION_ID, ticket.handle().form_value()),
        (FIELD_LINE_NO, line_no.to_string()),
    ]
}
