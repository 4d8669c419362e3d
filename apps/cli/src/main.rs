//! Newsforge CLI: research companies and topics from live news coverage.
//!
//! Searches news, filters the URLs worth reading, fetches their content
//! through a provider fallback chain, and emits a JSON research bundle.

mod commands;

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
