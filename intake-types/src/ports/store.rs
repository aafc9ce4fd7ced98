//! Transaction store port.
//!
//! The relational store is the source of truth for deduplication: its
//! uniqueness constraint on the idempotency key is the only lock intake has.

use chrono::{DateTime, Utc};

use crate::domain::{AccountId, LedgerAccountId, NewTransaction, Transaction, TransactionId};
use crate::error::RepoError;

#[async_trait::async_trait]
pub trait TransactionStore: Send + Sync + 'static {
    /// Inserts a transaction, assigning its id and creation time.
    ///
    /// A second insert with the same idempotency key MUST fail with
    /// `RepoError::DuplicateKey`, never with a generic database error.
    async fn create(
        &self,
        tx: &NewTransaction,
    ) -> Result<(TransactionId, DateTime<Utc>), RepoError>;

    /// Finds a transaction by its idempotency key.
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>, RepoError>;

    /// Whether the internal account exists.
    async fn account_exists(&self, id: AccountId) -> Result<bool, RepoError>;

    /// Maps an internal account to its external ledger account.
    async fn external_ledger_account_id(
        &self,
        id: AccountId,
    ) -> Result<Option<LedgerAccountId>, RepoError>;
}
