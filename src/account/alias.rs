//! Username -> wallet alias registry

use std::collections::BTreeMap;

use super::store::AccountStore;
use super::types::{Username, WalletId, ALIAS_SIGIL};
use crate::error::{LedgerError, LedgerResult};

/// Normalize a raw username: trim, lowercase, prefix with `@`.
///
/// The same normalization runs at registration and at lookup, so `Foo`,
/// `@foo` and ` @FOO ` all name the same alias.
pub fn normalize(raw: &str) -> LedgerResult<Username> {
    let name = raw.trim().to_lowercase();
    let name = if name.starts_with(ALIAS_SIGIL) {
        name
    } else {
        format!("{}{}", ALIAS_SIGIL, name)
    };

    if name.len() == ALIAS_SIGIL.len_utf8() {
        return Err(LedgerError::InvalidAlias(raw.to_string()));
    }
    Ok(name)
}

/// Alias registry. Only references wallets; balances stay in `AccountStore`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AliasRegistry {
    aliases: BTreeMap<Username, WalletId>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// Rebuild from persisted aliases. Names are normalized again and every
    /// target wallet is materialized in `accounts`.
    pub fn restore(
        entries: BTreeMap<String, WalletId>,
        accounts: &mut AccountStore,
    ) -> LedgerResult<Self> {
        let mut registry = Self::new();
        for (raw, wallet) in entries {
            registry.register(accounts, &wallet, &raw).map_err(|e| {
                LedgerError::PersistenceFailure(format!("alias {}: {}", raw, e))
            })?;
        }
        Ok(registry)
    }

    /// Bind `raw` to `wallet`.
    ///
    /// Re-registering a name by its current owner is a no-op success; any other
    /// wallet gets `AliasTaken`. The wallet is created at zero if unknown.
    pub fn register(
        &mut self,
        accounts: &mut AccountStore,
        wallet: &str,
        raw: &str,
    ) -> LedgerResult<Username> {
        let username = normalize(raw)?;

        if let Some(owner) = self.aliases.get(&username) {
            if owner != wallet {
                return Err(LedgerError::AliasTaken(username));
            }
        } else {
            self.aliases.insert(username.clone(), wallet.to_string());
        }

        accounts.get_or_create(wallet);
        Ok(username)
    }

    /// Look up the wallet bound to `raw`
    pub fn resolve(&self, raw: &str) -> LedgerResult<WalletId> {
        let username = normalize(raw)?;
        self.aliases
            .get(&username)
            .cloned()
            .ok_or(LedgerError::AliasNotFound(username))
    }

    /// First username bound to `wallet`, in sorted username order.
    ///
    /// When a wallet owns several names there is no guarantee which one a
    /// caller sees beyond that order being stable for a given registry.
    pub fn alias_of(&self, wallet: &str) -> Option<&Username> {
        self.aliases
            .iter()
            .find(|(_, owner)| owner.as_str() == wallet)
            .map(|(username, _)| username)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn aliases(&self) -> &BTreeMap<Username, WalletId> {
        &self.aliases
    }
}
