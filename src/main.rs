use clap::Parser;

use runstep::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    runstep::logging::init_tracing();
    cli::run(Cli::parse()).await
}
