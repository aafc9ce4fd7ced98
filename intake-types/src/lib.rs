//! # Intake Types
//!
//! Domain types, error taxonomy and port traits for the transaction intake
//! service. This crate has no IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate is the **innermost core** of the hexagonal architecture:
//! - `domain/` - Transactions, reservations, cache entries, queue messages
//! - `ports/` - Capabilities the adapters implement (store, ledger, cache, queue)
//! - `dto/` - Request/response shapes at the intake boundary
//! - `error/` - Per-port errors and the caller-facing `AppError`

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AccountId, CurrencyPolicy, FundsReservation, IdempotencyCacheEntry, LedgerAccountId,
    MessageType, NewTransaction, QueueMessage, ReservationId, Transaction, TransactionId,
    TransactionStatus,
};
pub use dto::*;
pub use error::{AppError, CacheError, ErrorKind, LedgerError, QueueError, RepoError};
pub use ports::{
    IdempotencyCache, Ledger, MessageQueue, QueueName, ReceivedMessage, TransactionStore,
};
