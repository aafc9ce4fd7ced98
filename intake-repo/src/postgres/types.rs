//! Database row types and their domain conversions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use intake_types::{
    AccountId, RepoError, ReservationId, Transaction, TransactionId, TransactionStatus,
};

/// Transaction row from database.
#[derive(FromRow)]
pub struct DbTransaction {
    pub id: Uuid,
    pub idempotency_key: String,
    pub from_account_id: Uuid,
    pub to_account_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub reservation_id: Uuid,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbTransaction {
    /// Convert database row to domain Transaction.
    pub fn into_domain(self) -> Result<Transaction, RepoError> {
        let status: TransactionStatus = self.status.parse().map_err(RepoError::Database)?;

        Ok(Transaction {
            id: TransactionId::from_uuid(self.id),
            idempotency_key: self.idempotency_key,
            from_account_id: AccountId::from_uuid(self.from_account_id),
            to_account_id: self.to_account_id.map(AccountId::from_uuid),
            amount: self.amount,
            currency: self.currency,
            status,
            reservation_id: ReservationId::from_uuid(self.reservation_id),
            description: self.description,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Ledger account balance and status, as seen under lock.
#[derive(FromRow)]
pub struct DbLedgerAccount {
    pub balance: Decimal,
    pub status: String,
}

/// Available balance (balance minus live holds) and status.
#[derive(FromRow)]
pub struct DbAvailableBalance {
    pub available: Decimal,
    pub status: String,
}

/// A message leased from the queue.
#[derive(FromRow)]
pub struct DbLeasedMessage {
    pub id: Uuid,
    pub receipt_handle: Uuid,
    pub body: String,
    pub receive_count: i32,
}
