//! Account System Module for the Zion ledger
//!
//! This module implements the wallet state model with:
//! - Decimal balances that never go negative
//! - Case-insensitive `@alias` names bound to wallets

pub mod alias;
pub mod store;
pub mod types;

pub use alias::{normalize, AliasRegistry};
pub use store::AccountStore;
pub use types::{Amount, Username, WalletId, ALIAS_SIGIL};
