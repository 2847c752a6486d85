//! Value transfers between wallets

use serde::Serialize;
use tracing::error;

use crate::account::types::ensure_positive;
use crate::account::{AccountStore, AliasRegistry, Amount, WalletId, ALIAS_SIGIL};
use crate::error::{LedgerError, LedgerResult};

/// Outcome of an applied transfer
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub sender_wallet_id: WalletId,
    /// Concrete wallet the destination resolved to (differs from the input
    /// when an alias was given)
    pub resolved_destination: WalletId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Amount,
    #[serde(with = "rust_decimal::serde::float")]
    pub sender_balance: Amount,
    #[serde(with = "rust_decimal::serde::float")]
    pub destination_balance: Amount,
}

/// Resolve a destination: `@names` go through the registry, anything else is
/// taken as a wallet id. Surrounding whitespace is ignored either way.
pub fn resolve_destination(aliases: &AliasRegistry, destination: &str) -> LedgerResult<WalletId> {
    let destination = destination.trim();
    if destination.starts_with(ALIAS_SIGIL) {
        aliases.resolve(destination)
    } else {
        Ok(destination.to_string())
    }
}

/// Moves funds between wallets of one `AccountStore`.
///
/// The engine borrows the store mutably for the whole validate-then-apply
/// sequence; the caller's lock makes the pair atomic to other threads.
pub struct TransferEngine<'a> {
    accounts: &'a mut AccountStore,
    aliases: &'a AliasRegistry,
}

impl<'a> TransferEngine<'a> {
    pub fn new(accounts: &'a mut AccountStore, aliases: &'a AliasRegistry) -> Self {
        Self { accounts, aliases }
    }

    pub fn transfer(
        &mut self,
        sender: &str,
        destination: &str,
        amount: Amount,
    ) -> LedgerResult<TransferReceipt> {
        ensure_positive(amount)?;

        let resolved = resolve_destination(self.aliases, destination)?;

        // Unknown senders read as zero here and are not created
        let available = self.accounts.balance(sender).unwrap_or_default();
        if available < amount {
            return Err(LedgerError::InsufficientFunds);
        }

        self.accounts.get_or_create(&resolved);

        self.accounts.debit(sender, amount)?;
        if let Err(e) = self.accounts.credit(&resolved, amount) {
            // Rollback: the sender held this amount a moment ago
            if let Err(rollback) = self.accounts.credit(sender, amount) {
                error!("Transfer rollback failed for {}: {}", sender, rollback);
            }
            return Err(e);
        }

        let sender_balance = self.accounts.balance(sender).unwrap_or_default();
        let destination_balance = self.accounts.balance(&resolved).unwrap_or_default();
        Ok(TransferReceipt {
            sender_wallet_id: sender.to_string(),
            resolved_destination: resolved,
            amount,
            sender_balance,
            destination_balance,
        })
    }
}
