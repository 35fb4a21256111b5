//! PaperForge CLI — research-paper generation from the command line.
//!
//! Collects grounding snippets from web search and an encyclopedia, asks a
//! generative model for a fixed-schema paper, and renders the result as a
//! PDF with citations.

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
