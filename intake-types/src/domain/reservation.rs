//! Ledger holds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{LedgerAccountId, ReservationId};

/// A temporary, expiring hold of funds on a ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundsReservation {
    pub id: ReservationId,
    pub account_id: LedgerAccountId,
    pub amount: Decimal,
    pub expires_at: DateTime<Utc>,
}

impl FundsReservation {
    /// Whether the hold still reduces the available balance at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expired_reservation_is_not_live() {
        let now = Utc::now();
        let reservation = FundsReservation {
            id: ReservationId::new(),
            account_id: LedgerAccountId::new(),
            amount: Decimal::ONE,
            expires_at: now - Duration::seconds(1),
        };

        assert!(!reservation.is_live(now));
        assert!(reservation.is_live(now - Duration::minutes(5)));
    }
}
