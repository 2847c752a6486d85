pub mod account; // wallet balances and aliases
pub mod cli;
pub mod config;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod node;
pub mod rpc;
pub mod storage;
pub mod transfer;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{Commit, Ledger};
