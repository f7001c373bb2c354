//! vault-enricher CLI: enrich markdown-vault entries from the web.
//!
//! Fetches an entry's source page, records its title, description, tags,
//! outbound links and preview image, and follows one matching external site.

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
