//! Behavior shared by the mock ledgers.

use std::time::Duration;

use rand::Rng;

/// Tuning for the mock ledger implementations.
#[derive(Debug, Clone, Copy)]
pub struct LedgerOptions {
    /// Lifetime of a hold before the ledger stops counting it
    pub reservation_ttl: Duration,
    /// Upper bound of the simulated network round-trip
    pub max_latency: Duration,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            reservation_ttl: Duration::from_secs(60 * 60),
            max_latency: Duration::from_millis(50),
        }
    }
}

impl LedgerOptions {
    /// No latency, for deterministic tests.
    pub fn instant() -> Self {
        Self {
            max_latency: Duration::ZERO,
            ..Self::default()
        }
    }

    pub(crate) fn reservation_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.reservation_ttl).unwrap_or(chrono::Duration::hours(1))
    }
}

/// Sleeps for a random slice of `max`, like a remote call would.
pub(crate) async fn simulate_latency(max: Duration) {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return;
    }
    let delay = rand::rng().random_range(0..=max_ms);
    tokio::time::sleep(Duration::from_millis(delay)).await;
}
