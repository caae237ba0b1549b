//! The UI collaborator.
//!
//! The session components never own presentation state. They read and
//! write it through [`View`]: breakpoint icons double as the displayed
//! breakpoint state, line elements carry the active-line styling, and
//! notices are the user-visible alerts.
//!
//! Implementations are called from async tasks with the session state lock
//! held, so they must be cheap and must not call back into the session
//! components.

mod notice;
mod source;

pub use notice::Notice;
pub use source::SourceView;

use crate::protocol::{BreakpointId, LineId};
use crate::session::{DebugMode, RunControl};

/// Displayed state of a breakpoint icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Icon {
    #[default]
    NoBreakpoint,
    Breakpoint,
}

pub trait View: Send + Sync + 'static {
    fn set_run_control(&self, control: RunControl);

    fn set_debug_mode(&self, mode: DebugMode);

    /// Shows a user-visible notice.
    fn notify(&self, notice: Notice);

    /// Current icon of `id`, or `None` if there is no such element.
    fn breakpoint_icon(&self, id: &BreakpointId) -> Option<Icon>;

    fn set_breakpoint_icon(&self, id: &BreakpointId, icon: Icon);

    /// Resets every icon to [`Icon::NoBreakpoint`].
    fn clear_breakpoint_icons(&self);

    fn has_line(&self, line: &LineId) -> bool;

    /// Applies or removes the active-line styling. Idempotent.
    fn set_line_active(&self, line: &LineId, active: bool);

    /// Appends program output to the terminal.
    fn append_output(&self, text: &str);

    /// Replaces the page with one served by the server.
    fn load_page(&self, page: &str);
}
