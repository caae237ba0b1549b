//! Terminal reload timer: pulls pending program output into the view.

use crate::protocol::{Endpoint, FIELD_INPUT, FIELD_SESSION_ID};
use crate::session::{SessionController, SessionTicket};

pub(crate) async fn run(session: SessionController, ticket: SessionTicket) {
    let interval = session.timing().reload_interval();
    let handle = ticket.handle();
    // An empty input line only polls.
    let fields = [
        (FIELD_SESSION_ID, handle.form_value()),
        (FIELD_INPUT, String::new()),
    ];

    loop {
        tokio::time::sleep(interval).await;
        if !session.is_current(ticket) {
            break;
        }

        match session.client().post(Endpoint::Shell, &fields).await {
            Ok(output) if output.is_empty() => {}
            Ok(output) => {
                if session
                    .with_current(ticket, |_, view| view.append_output(&output))
                    .is_none()
                {
                    break;
                }
            }
            Err(err) => tracing::debug!(session = %handle, error = %err, "Terminal reload failed"),
        }
    }
}
