//! Domain models for the intake pipeline.

pub mod ids;
pub mod idempotency;
pub mod message;
pub mod money;
pub mod reservation;
pub mod transaction;

pub use ids::{AccountId, LedgerAccountId, ReservationId, TransactionId};
pub use idempotency::IdempotencyCacheEntry;
pub use message::{MessageType, NotificationPayload, QueueMessage, TransactionPayload};
pub use money::CurrencyPolicy;
pub use reservation::FundsReservation;
pub use transaction::{NewTransaction, Transaction, TransactionStatus};
