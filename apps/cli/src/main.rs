//! energydocs CLI — Thai energy-sector document harvester.
//!
//! Crawls government and utility sites, screens records for personal data,
//! persists the run's artifact set, and distributes it best-effort.

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
