use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::ledger::Ledger;

/// EmissionScheduler mints the genesis yield into the architect wallet once
/// per interval.
///
/// Ticks go through `Ledger::emit`, so they take the same write lock as
/// transfers and mining. A paused or stalled process does not catch up on
/// missed intervals.
pub struct EmissionScheduler {
    pub ledger: Arc<Ledger>,
    pub period: Duration,
}

impl EmissionScheduler {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        let period = ledger.emission().interval();
        Self { ledger, period }
    }

    pub fn with_period(ledger: Arc<Ledger>, period: Duration) -> Self {
        Self { ledger, period }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.start())
    }

    pub async fn start(self) {
        if self.period.is_zero() {
            warn!("Emission interval is zero, scheduler disabled");
            return;
        }
        info!(
            "⏳ Emission Scheduler Started ({} SNG every {}s to {})",
            self.ledger.emission().reward,
            self.period.as_secs(),
            self.ledger.emission().architect_wallet
        );

        // First credit lands one full period after start
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            // emit takes the ledger lock and writes the snapshot file
            let ledger = self.ledger.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || Self::tick(&ledger)).await {
                error!("Emission task failed: {}", e);
            }
        }
    }

    fn tick(ledger: &Ledger) {
        match ledger.emit() {
            Ok(commit) => {
                info!(
                    "[ZION CORE] {} SNG injected into genesis wallet {}. Balance: {}",
                    ledger.emission().reward,
                    commit.value.wallet_id,
                    commit.value.new_balance
                );
                if let Some(e) = commit.warning {
                    warn!("Emission credited but not persisted: {}", e);
                }
            }
            Err(e) => error!("Emission tick failed: {}", e),
        }
    }
}
