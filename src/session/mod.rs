//! Session lifecycle: launch, termination polling, terminal feed and stop.
//!
//! [`SessionController`] is the root component. It owns the handle the
//! server assigned, the poll and reload timers, and the shared state the
//! breakpoint manager and debug dispatcher mutate. Every result that
//! arrives asynchronously is applied only if the [`SessionTicket`] it was
//! issued under is still the live one.

mod controller;
mod error;
mod feed;
pub mod lifecycle;
mod poller;

pub use controller::SessionController;
pub use error::SessionError;
pub use lifecycle::{DebugMode, RunControl, SessionTicket};
