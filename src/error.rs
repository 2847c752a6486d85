use thiserror::Error;

/// Failures surfaced by ledger operations.
///
/// Every variant leaves the in-memory ledger untouched, except
/// `PersistenceFailure` which is reported after the mutation was applied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    #[error("Insufficient funds or unknown wallet")]
    InsufficientFunds,
    #[error("Alias not found: {0}")]
    AliasNotFound(String),
    #[error("Alias {0} is already registered to another wallet")]
    AliasTaken(String),
    #[error("Invalid alias: {0:?}")]
    InvalidAlias(String),
    #[error("Balance overflow on wallet {0}")]
    BalanceOverflow(String),
    #[error("Persistence error: {0}")]
    PersistenceFailure(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
