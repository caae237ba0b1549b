//! Command-line front end.

mod console;
mod repl;

pub use console::ConsoleView;
pub use repl::{Repl, ReplCommand, HELP};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{Config, ConfigError};
use crate::session::{DebugMode, RunControl, SessionController};

#[derive(Debug, Parser)]
#[command(name = "runstep", version, about = "Run and step-debug programs on a remote session server")]
pub struct Cli {
    /// Config file (default: ~/.config/runstep/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL, overriding the config file
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a program and stream its output until it terminates
    Run { file: PathBuf },
    /// Open a program in the debugger and step through it interactively
    Debug { file: PathBuf },
}

impl Cli {
    /// Loads the config file and applies command-line overrides.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(server) = &self.server {
            config.server.base_url = server.clone();
            config.validate()?;
        }
        Ok(config)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    match &cli.command {
        Command::Run { file } => run_program(&config, file).await,
        Command::Debug { file } => debug_program(&config, file).await,
    }
}

async fn run_program(config: &Config, file: &Path) -> anyhow::Result<()> {
    let program = read_program(file)?;
    let view = Arc::new(ConsoleView::new(&program));
    let session = SessionController::new(config, view)?;
    let mut run_control = session.subscribe();

    session
        .start_session(&program)
        .await
        .context("failed to start session")?;

    tokio::select! {
        _ = run_control.wait_for(|control| *control == RunControl::Idle) => {}
        _ = tokio::signal::ctrl_c() => {
            if let Err(err) = session.stop_session().await {
                tracing::debug!(error = %err, "Stop on interrupt failed");
            }
        }
    }
    Ok(())
}

async fn debug_program(config: &Config, file: &Path) -> anyhow::Result<()> {
    let program = read_program(file)?;
    let view = Arc::new(ConsoleView::new(&program));
    let session = SessionController::new(config, view)?;
    let mut run_control = session.subscribe();

    session
        .toggle_debug_mode(&program)
        .await
        .context("failed to enter debug mode")?;

    let repl = Repl::new(session.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ReplCommand>() {
                    Ok(command) => {
                        if !repl.execute(command).await {
                            break;
                        }
                    }
                    Err(message) => eprintln!("{}", message),
                }
            }
            _ = run_control.wait_for(|control| *control == RunControl::Idle) => {
                println!("session ended");
                break;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if session.debug_mode() == DebugMode::On {
        session.toggle_debug_mode(&program).await?;
    }
    Ok(())
}

fn read_program(file: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("failed to read '{}'", file.display()))
}
