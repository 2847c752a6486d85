pub mod node;
pub mod snapshot;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "zion")]
#[command(about = "Zion Gateway - SNG ledger node", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Node operations
    Node {
        #[command(subcommand)]
        cmd: node::NodeCommands,
    },
    /// Print the balances and aliases held in a snapshot file
    Snapshot {
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value = "zion.toml")]
        config: String,
    },
}
