use clap::Parser;
use tracing_subscriber::EnvFilter;

use zion_ledger::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Node { cmd } => cli::node::handle_node_command(cmd).await?,
        Commands::Snapshot { path, config } => cli::snapshot::handle_snapshot_command(path, &config)?,
    }
    Ok(())
}
