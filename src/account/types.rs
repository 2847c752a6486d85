//! Account type definitions for the Zion ledger

use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};

/// Wallet identifier - opaque token such as `0xF497FFEB`
pub type WalletId = String;

/// Normalized alias, always `@`-prefixed and lowercase
pub type Username = String;

/// SNG amount. Decimal so transfers conserve value exactly.
pub type Amount = Decimal;

/// Prefix marking a destination or username as an alias
pub const ALIAS_SIGIL: char = '@';

/// Reject zero and negative amounts
pub fn ensure_positive(amount: Amount) -> LedgerResult<Amount> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_positive() {
        assert_eq!(ensure_positive(Decimal::ONE), Ok(Decimal::ONE));
        assert_eq!(ensure_positive(Decimal::ZERO), Err(LedgerError::InvalidAmount));
        assert_eq!(ensure_positive(Decimal::NEGATIVE_ONE), Err(LedgerError::InvalidAmount));
    }
}
