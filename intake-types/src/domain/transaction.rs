//! Transaction domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{AccountId, ReservationId, TransactionId};

/// Lifecycle of a transaction.
///
/// Intake only ever creates `Pending`; the settlement worker drives the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown transaction status: {}", other)),
        }
    }
}

/// A transaction that has not been persisted yet.
///
/// It has no identity: the store assigns the id and timestamps on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub idempotency_key: String,
    pub from_account_id: AccountId,
    /// None for external settlement targets
    pub to_account_id: Option<AccountId>,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    /// The ledger hold backing this transaction
    pub reservation_id: ReservationId,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl NewTransaction {
    /// Creates a pending transaction backed by the given reservation.
    pub fn pending(
        idempotency_key: String,
        from_account_id: AccountId,
        to_account_id: Option<AccountId>,
        amount: Decimal,
        currency: String,
        reservation_id: ReservationId,
    ) -> Self {
        Self {
            idempotency_key,
            from_account_id,
            to_account_id,
            amount,
            currency,
            status: TransactionStatus::Pending,
            reservation_id,
            description: None,
            metadata: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// The durable record of a money movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Globally unique deduplication key
    pub idempotency_key: String,
    pub from_account_id: AccountId,
    pub to_account_id: Option<AccountId>,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub reservation_id: ReservationId,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Materializes a persisted record from its pre-insert form.
    pub fn from_new(new: NewTransaction, id: TransactionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            idempotency_key: new.idempotency_key,
            from_account_id: new.from_account_id,
            to_account_id: new.to_account_id,
            amount: new.amount,
            currency: new.currency,
            status: new.status,
            reservation_id: new.reservation_id,
            description: new.description,
            metadata: new.metadata,
            created_at,
            updated_at: created_at,
        }
    }
}
