//! Transaction store on PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use intake_types::{
    AccountId, LedgerAccountId, NewTransaction, RepoError, Transaction, TransactionId,
    TransactionStore,
};

use super::types::DbTransaction;

const TRANSACTION_COLUMNS: &str = "id, idempotency_key, from_account_id, to_account_id, amount, \
     currency, status, reservation_id, description, metadata, created_at, updated_at";

/// Relational transaction store. The `transactions_idempotency_key_key`
/// constraint is what deduplicates concurrent creates.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers an internal account mapped to `ledger_account`.
    pub async fn create_account(
        &self,
        name: &str,
        ledger_account: LedgerAccountId,
    ) -> Result<AccountId, RepoError> {
        let id = AccountId::new();
        sqlx::query(
            "INSERT INTO accounts (id, name, external_ledger_account_id) VALUES ($1, $2, $3)",
        )
        .bind(id.as_uuid())
        .bind(name)
        .bind(ledger_account.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;
        Ok(id)
    }
}

#[async_trait]
impl TransactionStore for PostgresStore {
    async fn create(
        &self,
        tx: &NewTransaction,
    ) -> Result<(TransactionId, DateTime<Utc>), RepoError> {
        let row: (Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO transactions
                (idempotency_key, from_account_id, to_account_id, amount, currency,
                 status, reservation_id, description, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at
            "#,
        )
        .bind(&tx.idempotency_key)
        .bind(tx.from_account_id.as_uuid())
        .bind(tx.to_account_id.map(|id| id.into_uuid()))
        .bind(tx.amount)
        .bind(&tx.currency)
        .bind(tx.status.as_str())
        .bind(tx.reservation_id.as_uuid())
        .bind(&tx.description)
        .bind(&tx.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::DuplicateKey(tx.idempotency_key.clone())
            }
            other => RepoError::Database(other.to_string()),
        })?;

        Ok((TransactionId::from_uuid(row.0), row.1))
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>, RepoError> {
        let query = format!(
            "SELECT {} FROM transactions WHERE idempotency_key = $1",
            TRANSACTION_COLUMNS
        );
        let row: Option<DbTransaction> = sqlx::query_as(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn account_exists(&self, id: AccountId) -> Result<bool, RepoError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1)")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        Ok(exists)
    }

    async fn external_ledger_account_id(
        &self,
        id: AccountId,
    ) -> Result<Option<LedgerAccountId>, RepoError> {
        let ledger: Option<Uuid> =
            sqlx::query_scalar("SELECT external_ledger_account_id FROM accounts WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        Ok(ledger.map(LedgerAccountId::from_uuid))
    }
}
