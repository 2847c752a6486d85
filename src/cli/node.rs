use clap::Subcommand;

use crate::config::ZionConfig;
use crate::node::ZionNode;

#[derive(Subcommand)]
pub enum NodeCommands {
    /// Run the ledger node: RPC server plus emission scheduler
    Start {
        #[arg(long)]
        rpc_port: Option<u16>,
        #[arg(long, default_value = "zion.toml")]
        config: String,
    },
}

pub async fn handle_node_command(cmd: NodeCommands) -> std::io::Result<()> {
    match cmd {
        NodeCommands::Start { rpc_port, config } => {
            let config = ZionConfig::load_or_default(&config);
            ZionNode::new(config).start(rpc_port).await
        }
    }
}
