//! The single active-line highlight.

use crate::mvi::{Intent, Reducer, State};
use crate::protocol::{ActionReply, LineId};
use crate::view::View;

/// Line the debugger is stopped on, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveLine(Option<LineId>);

impl State for ActiveLine {}

impl ActiveLine {
    pub fn line(&self) -> Option<&LineId> {
        self.0.as_ref()
    }
}

#[derive(Debug)]
pub enum ActiveLineIntent {
    /// A `debugger_action` reply.
    Reply(ActionReply),
    /// The session ended.
    Reset,
}

impl Intent for ActiveLineIntent {}

pub struct ActiveLineReducer;

impl Reducer for ActiveLineReducer {
    type State = ActiveLine;
    type Intent = ActiveLineIntent;

    fn reduce(_state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            ActiveLineIntent::Reply(ActionReply::Line(line)) => ActiveLine(Some(line)),
            ActiveLineIntent::Reply(ActionReply::Fail | ActionReply::Died) => ActiveLine(None),
            ActiveLineIntent::Reset => ActiveLine(None),
        }
    }
}

/// Moves the highlight to match the reduced state.
///
/// The previous line is cleared before the next one is set, so at most one
/// element carries the styling at any point.
pub(crate) fn apply(state: &mut ActiveLine, intent: ActiveLineIntent, view: &dyn View) {
    let previous = std::mem::take(state);
    let next = ActiveLineReducer::reduce(previous.clone(), intent);

    if let Some(line) = previous.line() {
        view.set_line_active(line, false);
    }
    if let Some(line) = next.line() {
        view.set_line_active(line, true);
    }
    *state = next;
}
