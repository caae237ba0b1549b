//! Wire vocabulary of the session server.
//!
//! Every request is a form-encoded POST and every reply is a bare text
//! token. This module owns the endpoint names, the form field names and the
//! parsers that turn reply bodies into typed values. Nothing here performs
//! I/O.

use std::fmt;

/// Form field carrying the program text.
pub const FIELD_PROGRAM_CODE: &str = "program_code";
/// Form field carrying the session handle.
pub const FIELD_SESSION_ID: &str = "session_id";
/// Form field carrying a breakpoint line number.
pub const FIELD_LINE_NO: &str = "line_no";
/// Form field carrying a debugger action tag.
pub const FIELD_ACTION: &str = "action";
/// Form field carrying a line of terminal input.
pub const FIELD_INPUT: &str = "input";

const REPLY_OK: &str = "OK";
const REPLY_RUNNING: &str = "running";
const REPLY_TIMEOUT: &str = "timeout";
const REPLY_FAIL: &str = "FAIL";
const REPLY_DIED: &str = "DIED";

/// Server endpoints consumed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Run,
    Stop,
    CheckTermination,
    SetBreakpoint,
    RemoveBreakpoint,
    DebuggerAction,
    /// Full-page submit that switches the page into debug mode.
    Debugger,
    /// Terminal exchange: empty input polls pending output.
    Shell,
}

impl Endpoint {
    /// Path segment relative to the server base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Run => "run",
            Endpoint::Stop => "stop",
            Endpoint::CheckTermination => "check_termination",
            Endpoint::SetBreakpoint => "set_breakpoint",
            Endpoint::RemoveBreakpoint => "remove_breakpoint",
            Endpoint::DebuggerAction => "debugger_action",
            Endpoint::Debugger => "debugger",
            Endpoint::Shell => "shell",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Opaque server-assigned session handle. `0` means "no session".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionHandle(u64);

impl SessionHandle {
    pub const NONE: SessionHandle = SessionHandle(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Parses a `run` reply.
    ///
    /// The body must be a decimal integer, optionally surrounded by
    /// whitespace. `0` is how the server reports a failed launch, so it is
    /// rejected along with anything that is not a number.
    pub fn parse_reply(body: &str) -> Option<SessionHandle> {
        let value: u64 = body.trim().parse().ok()?;
        (value != 0).then_some(SessionHandle(value))
    }

    /// Finds the handle a debugger page announces.
    ///
    /// Looks for the first `session_id` marker followed by an integer, with
    /// any mix of whitespace, quotes, `=` or `:` in between.
    pub fn find_in_page(page: &str) -> Option<SessionHandle> {
        page.match_indices(FIELD_SESSION_ID).find_map(|(pos, marker)| {
            let rest = page[pos + marker.len()..]
                .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '=' | ':' | '"' | '\''));
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            Self::parse_reply(&digits)
        })
    }

    /// Form value for the `session_id` field.
    pub fn form_value(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reply to `check_termination`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    Running,
    /// The session exceeded its execution time budget.
    Timeout,
    /// Any other token: the session is over.
    Ended(String),
}

impl PollStatus {
    pub fn parse(body: &str) -> Self {
        match body {
            REPLY_RUNNING => PollStatus::Running,
            REPLY_TIMEOUT => PollStatus::Timeout,
            other => PollStatus::Ended(other.to_string()),
        }
    }
}

/// Reply to `stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReply {
    Ok,
    /// Server-reported error text.
    Failed(String),
}

impl StopReply {
    pub fn parse(body: &str) -> Self {
        if body == REPLY_OK {
            StopReply::Ok
        } else {
            StopReply::Failed(body.to_string())
        }
    }
}

/// Reply to `set_breakpoint`. Only an exact `OK` confirms the breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetBreakpointReply {
    Ok,
    Refused(String),
}

impl SetBreakpointReply {
    pub fn parse(body: &str) -> Self {
        if body == REPLY_OK {
            SetBreakpointReply::Ok
        } else {
            SetBreakpointReply::Refused(body.to_string())
        }
    }
}

/// Step and continue commands understood by `debugger_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugAction {
    Continue,
    StepOver,
    StepInto,
    StepOut,
}

impl DebugAction {
    pub const ALL: [DebugAction; 4] = [
        DebugAction::Continue,
        DebugAction::StepOver,
        DebugAction::StepInto,
        DebugAction::StepOut,
    ];

    /// Value of the `action` form field.
    pub fn tag(self) -> &'static str {
        match self {
            DebugAction::Continue => "continue",
            DebugAction::StepOver => "stepover",
            DebugAction::StepInto => "stepinto",
            DebugAction::StepOut => "stepout",
        }
    }
}

impl fmt::Display for DebugAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Reply to `debugger_action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReply {
    /// The debugger could not perform the action.
    Fail,
    /// The debuggee terminated.
    Died,
    /// The debuggee stopped on this line.
    Line(LineId),
}

impl ActionReply {
    pub fn parse(body: &str) -> Self {
        match body {
            REPLY_FAIL => ActionReply::Fail,
            REPLY_DIED => ActionReply::Died,
            line => ActionReply::Line(LineId::new(line)),
        }
    }
}

/// Identifier of a source line element, e.g. `line7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(String);

impl LineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Canonical identifier for a 1-based line number.
    pub fn for_line(number: u32) -> Self {
        Self(format!("line{number}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn line_number(&self) -> Option<u32> {
        trailing_number(&self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a breakpoint icon element, e.g. `dot5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakpointId(String);

impl BreakpointId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Canonical icon identifier for a 1-based line number.
    pub fn for_line(number: u32) -> Self {
        Self(format!("dot{number}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Line number sent as `line_no`: the digits trailing the prefix.
    pub fn line_number(&self) -> Option<u32> {
        trailing_number(&self.0)
    }
}

impl fmt::Display for BreakpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn trailing_number(id: &str) -> Option<u32> {
    let digits = id.trim_start_matches(|c: char| !c.is_ascii_digit());
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
