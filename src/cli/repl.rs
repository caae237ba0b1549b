//! Interactive debugger prompt.

use std::str::FromStr;

use crate::breakpoints::BreakpointManager;
use crate::debugger::DebugDispatcher;
use crate::protocol::{BreakpointId, DebugAction};
use crate::session::{SessionController, SessionError};
use crate::view::Icon;

pub const HELP: &str = "\
commands:
  c, continue      run to the next breakpoint
  n, over          step over
  s, into          step into
  o, out           step out
  b, break <N>     toggle the breakpoint on line N
  i, input <TEXT>  send a line to the program
  stop             stop the session
  h, help          show this help
  q, quit          leave debug mode";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Action(DebugAction),
    Break(u32),
    Input(String),
    Stop,
    Help,
    Quit,
}

impl FromStr for ReplCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "c" | "continue" => ReplCommand::Action(DebugAction::Continue),
            "n" | "over" => ReplCommand::Action(DebugAction::StepOver),
            "s" | "into" => ReplCommand::Action(DebugAction::StepInto),
            "o" | "out" => ReplCommand::Action(DebugAction::StepOut),
            "b" | "break" => {
                let line_no = rest
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("expected a line number, got '{}'", rest))?;
                return Ok(ReplCommand::Break(line_no));
            }
            "i" | "input" => return Ok(ReplCommand::Input(rest.to_string())),
            "stop" => ReplCommand::Stop,
            "h" | "help" => ReplCommand::Help,
            "q" | "quit" => ReplCommand::Quit,
            other => return Err(format!("unknown command '{}' (try 'help')", other)),
        };

        if !rest.is_empty() {
            return Err(format!("'{}' takes no argument", word));
        }
        Ok(command)
    }
}

/// Components a prompt command can drive.
pub struct Repl {
    pub session: SessionController,
    pub breakpoints: BreakpointManager,
    pub dispatcher: DebugDispatcher,
}

impl Repl {
    pub fn new(session: SessionController) -> Self {
        Self {
            breakpoints: BreakpointManager::new(session.clone()),
            dispatcher: DebugDispatcher::new(session.clone()),
            session,
        }
    }

    /// Executes one command. Returns false when the prompt should close.
    pub async fn execute(&self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Action(action) => match self.dispatcher.dispatch(action).await {
                Ok(Some(_)) => {}
                Ok(None) => println!("debuggee is not stopped on a line"),
                Err(err) => report(err),
            },
            ReplCommand::Break(line_no) => {
                let id = BreakpointId::for_line(line_no);
                match self.breakpoints.toggle_breakpoint(&id).await {
                    Ok(Icon::Breakpoint) => println!("breakpoint set on line {}", line_no),
                    Ok(Icon::NoBreakpoint) => println!("no breakpoint on line {}", line_no),
                    Err(err) => report(err),
                }
            }
            ReplCommand::Input(text) => {
                if let Err(err) = self.session.send_input(&text).await {
                    report(err);
                }
            }
            ReplCommand::Stop => {
                if let Err(err) = self.session.stop_session().await {
                    report(err);
                }
            }
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => return false,
        }
        true
    }
}

/// Prints errors the view has not already shown.
fn report(err: SessionError) {
    match err {
        SessionError::Transport(_) | SessionError::UnknownLine(_) | SessionError::Protocol { .. } => {
            tracing::debug!(error = %err, "Command failed");
        }
        other => eprintln!("{}", other),
    }
}
