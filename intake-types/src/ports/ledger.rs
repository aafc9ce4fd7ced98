//! External ledger ("bank") port.

use rust_decimal::Decimal;

use crate::domain::{FundsReservation, LedgerAccountId, ReservationId};
use crate::error::LedgerError;

#[async_trait::async_trait]
pub trait Ledger: Send + Sync + 'static {
    /// Advisory check: balance minus live reservations covers `amount`.
    ///
    /// Unknown accounts fail with `AccountNotFound`, inactive ones with
    /// `AccountInactive`.
    async fn has_sufficient_funds(
        &self,
        account: LedgerAccountId,
        amount: Decimal,
    ) -> Result<bool, LedgerError>;

    /// Places an expiring hold.
    ///
    /// MUST be atomic per account: concurrent holds can never jointly exceed
    /// the available balance. A shortfall here is `InsufficientFunds`.
    async fn reserve_funds(
        &self,
        account: LedgerAccountId,
        amount: Decimal,
    ) -> Result<FundsReservation, LedgerError>;

    /// Releases a hold. Releasing an unknown or already released hold succeeds.
    async fn release_funds(
        &self,
        account: LedgerAccountId,
        reservation: ReservationId,
    ) -> Result<(), LedgerError>;
}
