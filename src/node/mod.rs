use std::sync::Arc;
use tracing::info;

use crate::config::ZionConfig;
use crate::ledger::Ledger;
use crate::rpc::RpcServer;
use crate::storage::JsonFileStore;

pub mod emission;

pub use emission::EmissionScheduler;

pub struct ZionNode {
    pub ledger: Arc<Ledger>,
    pub config: ZionConfig,
}

impl ZionNode {
    pub fn new(config: ZionConfig) -> Self {
        info!("Starting Zion Node...");

        // --- Storage & Persistence (restored first) ---
        info!(
            "Persistence: Opening snapshot at '{}'...",
            config.node.snapshot_path
        );
        let storage = Arc::new(JsonFileStore::new(&config.node.snapshot_path));
        let ledger = Arc::new(Ledger::with_storage(config.emission.clone(), storage));

        Self { ledger, config }
    }

    pub async fn start(self, rpc_port_val: Option<u16>) -> std::io::Result<()> {
        info!("Starting Zion Node Services...");

        let rpc_port = rpc_port_val.unwrap_or(self.config.node.rpc_port);

        // 1. Genesis yield
        let scheduler = EmissionScheduler::new(self.ledger.clone()).spawn();

        // 2. RPC Server (runs until the listener fails)
        let server = RpcServer::new(self.ledger.clone(), rpc_port);
        let result = server.start().await;

        scheduler.abort();
        result
    }
}
