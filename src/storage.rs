use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::account::{Amount, Username, WalletId};
use crate::error::{LedgerError, LedgerResult};

/// Full persisted state: every balance and every alias, written together.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LedgerSnapshot {
    #[serde(with = "exact_balances")]
    pub ledger: BTreeMap<WalletId, Amount>,
    #[serde(default)]
    pub aliases: BTreeMap<Username, WalletId>,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> LedgerResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::PersistenceFailure(format!("serialize snapshot: {}", e)))
    }

    pub fn from_json(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| LedgerError::PersistenceFailure(format!("parse snapshot: {}", e)))
    }
}

/// Balances are JSON numbers on disk, written with every decimal digit so a
/// restore reproduces them exactly.
mod exact_balances {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    #[serde(transparent)]
    struct Exact(#[serde(with = "rust_decimal::serde::arbitrary_precision")] Decimal);

    pub fn serialize<S: Serializer>(
        balances: &BTreeMap<String, Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(balances.iter().map(|(wallet, balance)| (wallet, Exact(*balance))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Decimal>, D::Error> {
        let raw = BTreeMap::<String, Exact>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|(wallet, Exact(balance))| (wallet, balance)).collect())
    }
}

/// Durable backing for ledger snapshots
pub trait SnapshotStore: Send + Sync {
    /// Read the last persisted snapshot. `Ok(None)` when nothing was ever written.
    fn load(&self) -> LedgerResult<Option<LedgerSnapshot>>;

    /// Replace the persisted snapshot. Either the new snapshot is fully
    /// written or the previous one stays in place.
    fn persist(&self, snapshot: &LedgerSnapshot) -> LedgerResult<()>;
}

/// Snapshot kept in a single JSON file, replaced atomically on each persist.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> LedgerResult<Option<LedgerSnapshot>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LedgerError::PersistenceFailure(format!(
                    "read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        LedgerSnapshot::from_json(&contents).map(Some)
    }

    fn persist(&self, snapshot: &LedgerSnapshot) -> LedgerResult<()> {
        let json = snapshot.to_json()?;
        let io_err = |e: std::io::Error| {
            LedgerError::PersistenceFailure(format!("write {}: {}", self.path.display(), e))
        };

        let parent = self.parent_dir();
        fs::create_dir_all(parent).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        sync_parent_dir(parent);

        debug!(
            path = %self.path.display(),
            wallets = snapshot.ledger.len(),
            aliases = snapshot.aliases.len(),
            "Persistence: snapshot written"
        );
        Ok(())
    }
}

/// Flush the directory entry so the rename itself survives a crash.
/// Best-effort: some platforms and filesystems refuse to sync directories.
fn sync_parent_dir(parent: &Path) {
    #[cfg(unix)]
    {
        if let Err(e) = fs::File::open(parent).and_then(|d| d.sync_all()) {
            debug!(path = %parent.display(), "Parent directory sync_all failed (best-effort): {e}");
        }
    }
    #[cfg(not(unix))]
    let _ = parent;
}
