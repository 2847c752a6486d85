use rust_decimal::Decimal;

use crate::config::EmissionConfig;
use crate::storage::LedgerSnapshot;

/// Genesis state: the architect wallet at zero with its alias bound to it.
///
/// Used when no snapshot exists yet or the stored one cannot be trusted.
pub fn genesis_snapshot(emission: &EmissionConfig) -> LedgerSnapshot {
    let mut snapshot = LedgerSnapshot::default();
    snapshot
        .ledger
        .insert(emission.architect_wallet.clone(), Decimal::ZERO);
    snapshot.aliases.insert(
        emission.architect_alias.clone(),
        emission.architect_wallet.clone(),
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_snapshot() {
        let emission = EmissionConfig::default();
        let snapshot = genesis_snapshot(&emission);

        assert_eq!(snapshot.ledger.len(), 1);
        assert_eq!(snapshot.ledger[&emission.architect_wallet], Decimal::ZERO);
        assert_eq!(
            snapshot.aliases[&emission.architect_alias],
            emission.architect_wallet
        );
    }
}
