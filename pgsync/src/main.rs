use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pgsync_config::ConfigLoader;
use pgsync_core::{FileStateStore, Orchestrator};
use tracing_subscriber::EnvFilter;

/// Incrementally syncs the relational filmwork catalog into the search
/// index, polling the source on a fixed interval until killed.
#[derive(Debug, Parser)]
#[command(name = "pgsync", version, about)]
struct Cli {
    /// Path to the JSON configuration file (spec.md §6).
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = ConfigLoader::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    let state = Box::new(FileStateStore::new(config.state_file_path.clone()));

    let orchestrator = Orchestrator::connect(config, state)
        .await
        .context("connecting to source database")?;

    orchestrator.run().await;
    Ok(())
}
