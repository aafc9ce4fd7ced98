//! Funds Reservation Coordinator.
//!
//! The balance pre-check is advisory and only saves a ledger round-trip for
//! obviously short accounts. The hold placed by `reserve` is what actually
//! guarantees the funds, so it is never skipped.

use std::sync::Arc;

use rust_decimal::Decimal;

use intake_types::{AppError, FundsReservation, Ledger, LedgerAccountId};

pub struct FundsCoordinator {
    ledger: Arc<dyn Ledger>,
}

impl FundsCoordinator {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Advisory balance check. A shortfall here is a validation failure.
    pub async fn ensure_sufficient_funds(
        &self,
        account: LedgerAccountId,
        amount: Decimal,
    ) -> Result<(), AppError> {
        let sufficient = self
            .ledger
            .has_sufficient_funds(account, amount)
            .await
            .map_err(AppError::from)?;

        if !sufficient {
            tracing::debug!(%account, %amount, "balance pre-check failed");
            return Err(AppError::Validation("insufficient funds".into()));
        }
        Ok(())
    }

    /// Places the hold. A shortfall here is `Forbidden`.
    pub async fn reserve(
        &self,
        account: LedgerAccountId,
        amount: Decimal,
    ) -> Result<FundsReservation, AppError> {
        self.ledger
            .reserve_funds(account, amount)
            .await
            .map_err(AppError::from)
    }

    /// Pre-check, then `gate`, then the hold. `gate` carries the checks that
    /// must be reported after a balance shortfall but before any hold exists.
    pub async fn check_and_reserve<F>(
        &self,
        account: LedgerAccountId,
        amount: Decimal,
        gate: F,
    ) -> Result<FundsReservation, AppError>
    where
        F: FnOnce() -> Result<(), AppError> + Send,
    {
        self.ensure_sufficient_funds(account, amount).await?;
        gate()?;
        self.reserve(account, amount).await
    }

    /// Best-effort release; the hold expires on its own if this fails.
    pub async fn release(&self, reservation: &FundsReservation) {
        match self
            .ledger
            .release_funds(reservation.account_id, reservation.id)
            .await
        {
            Ok(()) => {
                tracing::debug!(reservation = %reservation.id, "reservation released");
            }
            Err(e) => {
                tracing::warn!(
                    reservation = %reservation.id,
                    account = %reservation.account_id,
                    error = %e,
                    "failed to release reservation, leaving it to expire"
                );
            }
        }
    }
}
