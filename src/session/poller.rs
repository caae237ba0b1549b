//! Termination poller.
//!
//! Asks `check_termination` once per poll interval until the server
//! reports anything other than `running`. The task is aborted when the
//! session ends through another path; a reply that still arrives is
//! dropped by the ticket check in [`SessionController::finish`].

use crate::protocol::{Endpoint, PollStatus, FIELD_SESSION_ID};
use crate::session::{SessionController, SessionTicket};

pub(crate) async fn run(session: SessionController, ticket: SessionTicket) {
    let interval = session.timing().poll_interval();
    let handle = ticket.handle();
    let fields = [(FIELD_SESSION_ID, handle.form_value())];

    loop {
        tokio::time::sleep(interval).await;
        if !session.is_current(ticket) {
            break;
        }

        let status = match session
            .client()
            .post(Endpoint::CheckTermination, &fields)
            .await
        {
            Ok(body) => PollStatus::parse(&body),
            Err(err) => {
                tracing::warn!(session = %handle, error = %err, "Termination poll failed");
                continue;
            }
        };

        if status == PollStatus::Running {
            tracing::trace!(session = %handle, "Session still running");
            continue;
        }

        if session.finish(ticket, &status) {
            tracing::info!(session = %handle, ?status, "Session ended");
        } else {
            tracing::debug!(session = %handle, ?status, "Discarded poll result for an ended session");
        }
        break;
    }
}
