//! econpub CLI: build an EPUB of the latest Economist weekly edition.
//!
//! Fetches the edition's articles with a subscriber session, assembles them
//! into one Markdown document, and hands that to pandoc.

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
