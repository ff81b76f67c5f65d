//! Huddle CLI: a single-topic NFL responder.
//!
//! Answers one question, runs an interactive chat on stdin, or serves the
//! `/api/chat` endpoint over HTTP.

mod commands;
mod server;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
