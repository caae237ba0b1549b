//! Run/stop lifecycle of a session.
//!
//! `Idle` → `Starting` when a launch request goes out, `Starting` → `Active`
//! when the server hands back a handle, and back to `Idle` on launch
//! failure, explicit stop or observed termination. Launches are numbered by
//! a generation so replies for an abandoned launch cannot revive it.

use std::fmt;

use crate::mvi::{Intent, Reducer, State};
use crate::protocol::SessionHandle;

/// Identity of one live session: the server handle plus the local launch
/// generation it was obtained in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTicket {
    handle: SessionHandle,
    generation: u64,
}

impl SessionTicket {
    pub fn new(handle: SessionHandle, generation: u64) -> Self {
        Self { handle, generation }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for SessionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.handle, self.generation)
    }
}

/// The single run/stop control shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunControl {
    /// Shows "run".
    #[default]
    Idle,
    /// Shows "stop". Covers both plain runs and debugging.
    Active,
}

/// Whether the page is in debug mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugMode {
    #[default]
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    /// A launch request is in flight.
    Starting { generation: u64 },
    Active { ticket: SessionTicket },
}

impl State for LifecycleState {}

impl LifecycleState {
    pub fn is_idle(&self) -> bool {
        matches!(self, LifecycleState::Idle)
    }

    /// The live session, if any.
    pub fn ticket(&self) -> Option<SessionTicket> {
        match self {
            LifecycleState::Active { ticket } => Some(*ticket),
            _ => None,
        }
    }

    /// Current handle; `SessionHandle::NONE` unless a session is live.
    pub fn handle(&self) -> SessionHandle {
        self.ticket()
            .map(|t| t.handle())
            .unwrap_or(SessionHandle::NONE)
    }

    /// A launch in flight already shows "stop".
    pub fn run_control(&self) -> RunControl {
        match self {
            LifecycleState::Idle => RunControl::Idle,
            LifecycleState::Starting { .. } | LifecycleState::Active { .. } => RunControl::Active,
        }
    }
}

#[derive(Debug)]
pub enum LifecycleIntent {
    /// A launch request was issued.
    Launch { generation: u64 },
    /// The server accepted the launch.
    Launched { ticket: SessionTicket },
    /// The launch failed or its reply was unusable.
    LaunchFailed { generation: u64 },
    /// The user stopped the session.
    Stop,
    /// The poller observed the end of this session.
    Terminated { ticket: SessionTicket },
}

impl Intent for LifecycleIntent {}

pub struct LifecycleReducer;

impl Reducer for LifecycleReducer {
    type State = LifecycleState;
    type Intent = LifecycleIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            LifecycleIntent::Launch { generation } => match state {
                LifecycleState::Idle => LifecycleState::Starting { generation },
                other => other,
            },

            LifecycleIntent::Launched { ticket } => match state {
                LifecycleState::Starting { generation } if generation == ticket.generation() => {
                    LifecycleState::Active { ticket }
                }
                other => other,
            },

            LifecycleIntent::LaunchFailed { generation } => match state {
                LifecycleState::Starting { generation: current } if current == generation => {
                    LifecycleState::Idle
                }
                other => other,
            },

            LifecycleIntent::Stop => LifecycleState::Idle,

            LifecycleIntent::Terminated { ticket } => match state {
                LifecycleState::Active { ticket: current } if current == ticket => {
                    LifecycleState::Idle
                }
                other => other,
            },
        }
    }
}
