use std::sync::Arc;

use crate::config::ZionConfig;
use crate::error::LedgerResult;
use crate::ledger::Ledger;
use crate::rpc::types::UNKNOWN_ALIAS;
use crate::storage::JsonFileStore;

/// Render the ledger a node would restore from `path`, one wallet per line
pub fn render_snapshot(ledger: &Ledger) -> LedgerResult<String> {
    let snapshot = ledger.snapshot()?;
    let mut out = String::new();

    out.push_str(&format!("{:<24} {:>20}  {}\n", "WALLET", "BALANCE (SNG)", "ALIAS"));
    for (wallet, balance) in &snapshot.ledger {
        let alias = ledger.alias_of(wallet)?;
        out.push_str(&format!(
            "{:<24} {:>20}  {}\n",
            wallet,
            balance,
            alias.as_deref().unwrap_or(UNKNOWN_ALIAS)
        ));
    }
    out.push_str(&format!(
        "\n{} wallets, {} aliases, total supply {} SNG\n",
        snapshot.ledger.len(),
        snapshot.aliases.len(),
        snapshot.ledger.values().copied().sum::<rust_decimal::Decimal>()
    ));
    Ok(out)
}

pub fn handle_snapshot_command(path: Option<String>, config: &str) -> LedgerResult<()> {
    let config = ZionConfig::load_or_default(config);
    let path = path.unwrap_or(config.node.snapshot_path);
    let ledger = Ledger::with_storage(config.emission, Arc::new(JsonFileStore::new(path)));
    print!("{}", render_snapshot(&ledger)?);
    Ok(())
}
