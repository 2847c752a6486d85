//! Balance storage for all wallets

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::types::{ensure_positive, Amount, WalletId};
use crate::error::{LedgerError, LedgerResult};

/// Account store owning every wallet balance.
///
/// Balances only change through `credit` and `debit`, both of which validate
/// before touching the map, so a failed call never leaves a partial update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountStore {
    balances: BTreeMap<WalletId, Amount>,
}

impl AccountStore {
    /// Create a new empty account store
    pub fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
        }
    }

    /// Rebuild a store from persisted balances, rejecting negative entries
    pub fn from_balances(balances: BTreeMap<WalletId, Amount>) -> LedgerResult<Self> {
        if let Some((wallet, balance)) = balances.iter().find(|(_, b)| **b < Decimal::ZERO) {
            return Err(LedgerError::PersistenceFailure(format!(
                "negative balance {} for wallet {}",
                balance, wallet
            )));
        }
        Ok(Self { balances })
    }

    /// Current balance, without creating the wallet
    pub fn balance(&self, wallet: &str) -> Option<Amount> {
        self.balances.get(wallet).copied()
    }

    pub fn contains(&self, wallet: &str) -> bool {
        self.balances.contains_key(wallet)
    }

    /// Get the balance, registering the wallet at zero if it was never seen.
    ///
    /// Returns the balance and whether the wallet was created by this call.
    pub fn get_or_create(&mut self, wallet: &str) -> (Amount, bool) {
        if let Some(balance) = self.balances.get(wallet) {
            return (*balance, false);
        }
        self.balances.insert(wallet.to_string(), Decimal::ZERO);
        (Decimal::ZERO, true)
    }

    /// Credit (add) balance to a wallet, creating it if absent
    pub fn credit(&mut self, wallet: &str, amount: Amount) -> LedgerResult<Amount> {
        ensure_positive(amount)?;

        let current = self.balance(wallet).unwrap_or(Decimal::ZERO);
        let new_balance = current
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow(wallet.to_string()))?;

        self.balances.insert(wallet.to_string(), new_balance);
        Ok(new_balance)
    }

    /// Debit (subtract) balance from a wallet.
    ///
    /// An unknown wallet is reported as `InsufficientFunds`, same as a wallet
    /// whose balance is too low.
    pub fn debit(&mut self, wallet: &str, amount: Amount) -> LedgerResult<Amount> {
        ensure_positive(amount)?;

        let balance = self
            .balances
            .get_mut(wallet)
            .ok_or(LedgerError::InsufficientFunds)?;

        if *balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }

        *balance -= amount;
        Ok(*balance)
    }

    /// Sum of all balances
    pub fn total_supply(&self) -> Amount {
        self.balances.values().copied().sum()
    }

    /// Number of known wallets
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn balances(&self) -> &BTreeMap<WalletId, Amount> {
        &self.balances
    }
}
