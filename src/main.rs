mod args;
mod cli;
mod context;
mod logging;
mod model;
mod options;
mod orchestrator;
mod presets;
mod process;
mod summary;
#[cfg(feature = "tui")]
mod tui;
mod validate;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args).await
}
