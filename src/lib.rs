//! Client for a remote program-execution and step-debugging server.
//!
//! A [`session::SessionController`] launches a program on the server and
//! tracks the handle it gets back; the termination poller and terminal
//! feed run while the session lives. [`breakpoints::BreakpointManager`]
//! and [`debugger::DebugDispatcher`] act on the same session. All
//! presentation goes through the [`view::View`] collaborator.

pub mod breakpoints;
pub mod cli;
pub mod config;
pub mod debugger;
pub mod logging;
pub mod mvi;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod view;
