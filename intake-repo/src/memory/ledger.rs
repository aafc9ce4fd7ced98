//! In-memory mock ledger.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use intake_types::{FundsReservation, Ledger, LedgerAccountId, LedgerError, ReservationId};

use crate::simulation::{LedgerOptions, simulate_latency};

const ACTIVE: &str = "active";

struct LedgerAccount {
    balance: Decimal,
    status: String,
    reservations: HashMap<ReservationId, FundsReservation>,
}

impl LedgerAccount {
    fn available(&self) -> Decimal {
        let now = Utc::now();
        let held: Decimal = self
            .reservations
            .values()
            .filter(|r| r.is_live(now))
            .map(|r| r.amount)
            .sum();
        self.balance - held
    }

    fn ensure_active(&self, account: LedgerAccountId) -> Result<(), LedgerError> {
        if self.status != ACTIVE {
            return Err(LedgerError::AccountInactive {
                account,
                status: self.status.clone(),
            });
        }
        Ok(())
    }
}

/// Ledger whose accounts each sit behind their own async mutex; the
/// check-and-hold in `reserve_funds` runs entirely under that lock.
pub struct MemoryLedger {
    accounts: DashMap<LedgerAccountId, Arc<Mutex<LedgerAccount>>>,
    options: LedgerOptions,
    calls: AtomicUsize,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(LedgerOptions::default())
    }
}

impl MemoryLedger {
    pub fn new(options: LedgerOptions) -> Self {
        Self {
            accounts: DashMap::new(),
            options,
            calls: AtomicUsize::new(0),
        }
    }

    /// Opens an active account.
    pub fn open_account(&self, balance: Decimal) -> LedgerAccountId {
        self.open_account_with_status(balance, ACTIVE)
    }

    pub fn open_account_with_status(&self, balance: Decimal, status: &str) -> LedgerAccountId {
        let id = LedgerAccountId::new();
        self.accounts.insert(
            id,
            Arc::new(Mutex::new(LedgerAccount {
                balance,
                status: status.to_string(),
                reservations: HashMap::new(),
            })),
        );
        id
    }

    /// Holds on `account` that still count against its balance.
    pub async fn live_reservations(&self, account: LedgerAccountId) -> Vec<FundsReservation> {
        let Some(slot) = self.slot(account) else {
            return Vec::new();
        };
        let guard = slot.lock().await;
        let now = Utc::now();
        guard
            .reservations
            .values()
            .filter(|r| r.is_live(now))
            .cloned()
            .collect()
    }

    /// Total number of port calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn slot(&self, account: LedgerAccountId) -> Option<Arc<Mutex<LedgerAccount>>> {
        self.accounts.get(&account).map(|entry| entry.value().clone())
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        simulate_latency(self.options.max_latency).await;
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn has_sufficient_funds(
        &self,
        account: LedgerAccountId,
        amount: Decimal,
    ) -> Result<bool, LedgerError> {
        self.enter().await;

        let slot = self.slot(account).ok_or(LedgerError::AccountNotFound(account))?;
        let guard = slot.lock().await;
        guard.ensure_active(account)?;
        Ok(guard.available() >= amount)
    }

    async fn reserve_funds(
        &self,
        account: LedgerAccountId,
        amount: Decimal,
    ) -> Result<FundsReservation, LedgerError> {
        self.enter().await;

        let slot = self.slot(account).ok_or(LedgerError::AccountNotFound(account))?;
        let mut guard = slot.lock().await;
        guard.ensure_active(account)?;

        let now = Utc::now();
        guard.reservations.retain(|_, r| r.is_live(now));

        let available = guard.available();
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                available,
                requested: amount,
            });
        }

        let reservation = FundsReservation {
            id: ReservationId::new(),
            account_id: account,
            amount,
            expires_at: now + self.options.reservation_ttl_chrono(),
        };
        guard.reservations.insert(reservation.id, reservation.clone());

        tracing::debug!(%account, reservation = %reservation.id, %amount, "funds reserved");
        Ok(reservation)
    }

    async fn release_funds(
        &self,
        account: LedgerAccountId,
        reservation: ReservationId,
    ) -> Result<(), LedgerError> {
        self.enter().await;

        if let Some(slot) = self.slot(account) {
            slot.lock().await.reservations.remove(&reservation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_unknown_account() {
        let ledger = MemoryLedger::new(LedgerOptions::instant());
        let missing = LedgerAccountId::new();

        let result = ledger.has_sufficient_funds(missing, Decimal::ONE).await;

        assert!(matches!(result, Err(LedgerError::AccountNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_inactive_account() {
        let ledger = MemoryLedger::new(LedgerOptions::instant());
        let account = ledger.open_account_with_status(Decimal::new(100, 0), "frozen");

        let result = ledger.reserve_funds(account, Decimal::ONE).await;

        assert!(
            matches!(result, Err(LedgerError::AccountInactive { status, .. }) if status == "frozen")
        );
    }

    #[tokio::test]
    async fn test_reservations_reduce_available_balance() {
        let ledger = MemoryLedger::new(LedgerOptions::instant());
        let account = ledger.open_account(Decimal::new(100, 0));

        ledger.reserve_funds(account, Decimal::new(60, 0)).await.unwrap();

        assert!(ledger.has_sufficient_funds(account, Decimal::new(40, 0)).await.unwrap());
        assert!(!ledger.has_sufficient_funds(account, Decimal::new(41, 0)).await.unwrap());
        let second = ledger.reserve_funds(account, Decimal::new(41, 0)).await;
        assert!(matches!(second, Err(LedgerError::InsufficientFunds { .. })));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let ledger = MemoryLedger::new(LedgerOptions::instant());
        let account = ledger.open_account(Decimal::new(10, 0));
        let hold = ledger.reserve_funds(account, Decimal::new(10, 0)).await.unwrap();

        ledger.release_funds(account, hold.id).await.unwrap();
        ledger.release_funds(account, hold.id).await.unwrap();
        ledger.release_funds(account, ReservationId::new()).await.unwrap();

        assert!(ledger.live_reservations(account).await.is_empty());
        assert!(ledger.has_sufficient_funds(account, Decimal::new(10, 0)).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_holds_do_not_count() {
        let ledger = MemoryLedger::new(LedgerOptions {
            reservation_ttl: Duration::ZERO,
            max_latency: Duration::ZERO,
        });
        let account = ledger.open_account(Decimal::new(10, 0));

        ledger.reserve_funds(account, Decimal::new(10, 0)).await.unwrap();

        assert!(ledger.live_reservations(account).await.is_empty());
        assert!(ledger.has_sufficient_funds(account, Decimal::new(10, 0)).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_holds_are_pruned_on_reserve() {
        let ledger = MemoryLedger::new(LedgerOptions {
            reservation_ttl: Duration::ZERO,
            max_latency: Duration::ZERO,
        });
        let account = ledger.open_account(Decimal::new(10, 0));

        for _ in 0..3 {
            ledger.reserve_funds(account, Decimal::new(10, 0)).await.unwrap();
        }

        // Only the hold placed by the last call is still stored.
        let slot = ledger.slot(account).unwrap();
        assert_eq!(slot.lock().await.reservations.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_never_overdraw() {
        let ledger = Arc::new(MemoryLedger::new(LedgerOptions {
            max_latency: Duration::from_millis(5),
            ..LedgerOptions::default()
        }));
        let account = ledger.open_account(Decimal::new(100, 0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.reserve_funds(account, Decimal::new(30, 0)).await
            }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                granted += 1;
            }
        }

        assert_eq!(granted, 3);
        assert_eq!(ledger.live_reservations(account).await.len(), 3);
        assert_eq!(ledger.call_count(), 20);
    }
}
