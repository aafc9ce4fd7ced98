//! Mock external ledger on PostgreSQL.
//!
//! Holds are rows in `ledger_reservations`; a hold counts against the balance
//! until it is released or expires. Reservation takes the account row lock, so
//! concurrent holds on one account serialize in the database.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use intake_types::{FundsReservation, Ledger, LedgerAccountId, LedgerError, ReservationId};

use super::types::{DbAvailableBalance, DbLedgerAccount};
use crate::simulation::{LedgerOptions, simulate_latency};

const ACTIVE: &str = "active";

fn unavailable(e: sqlx::Error) -> LedgerError {
    LedgerError::Unavailable(e.to_string())
}

#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
    options: LedgerOptions,
}

impl PostgresLedger {
    pub fn new(pool: PgPool, options: LedgerOptions) -> Self {
        Self { pool, options }
    }

    /// Opens a ledger account with an initial balance.
    pub async fn open_account(
        &self,
        balance: Decimal,
        status: &str,
    ) -> Result<LedgerAccountId, LedgerError> {
        let id = LedgerAccountId::new();
        sqlx::query("INSERT INTO ledger_accounts (id, balance, status) VALUES ($1, $2, $3)")
            .bind(id.as_uuid())
            .bind(balance)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(id)
    }

    async fn live_holds<'e, E>(executor: E, account: LedgerAccountId) -> Result<Decimal, LedgerError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let held: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM ledger_reservations
            WHERE account_id = $1 AND released_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(account.as_uuid())
        .fetch_one(executor)
        .await
        .map_err(unavailable)?;
        Ok(held)
    }
}

#[async_trait]
impl Ledger for PostgresLedger {
    async fn has_sufficient_funds(
        &self,
        account: LedgerAccountId,
        amount: Decimal,
    ) -> Result<bool, LedgerError> {
        simulate_latency(self.options.max_latency).await;

        let row: Option<DbAvailableBalance> = sqlx::query_as(
            r#"
            SELECT a.balance - COALESCE((
                       SELECT SUM(r.amount) FROM ledger_reservations r
                       WHERE r.account_id = a.id
                         AND r.released_at IS NULL
                         AND r.expires_at > NOW()
                   ), 0) AS available,
                   a.status
            FROM ledger_accounts a
            WHERE a.id = $1
            "#,
        )
        .bind(account.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        let row = row.ok_or(LedgerError::AccountNotFound(account))?;
        if row.status != ACTIVE {
            return Err(LedgerError::AccountInactive {
                account,
                status: row.status,
            });
        }
        Ok(row.available >= amount)
    }

    async fn reserve_funds(
        &self,
        account: LedgerAccountId,
        amount: Decimal,
    ) -> Result<FundsReservation, LedgerError> {
        simulate_latency(self.options.max_latency).await;

        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let locked: Option<DbLedgerAccount> =
            sqlx::query_as("SELECT balance, status FROM ledger_accounts WHERE id = $1 FOR UPDATE")
                .bind(account.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(unavailable)?;

        let locked = locked.ok_or(LedgerError::AccountNotFound(account))?;
        if locked.status != ACTIVE {
            return Err(LedgerError::AccountInactive {
                account,
                status: locked.status,
            });
        }

        let available = locked.balance - Self::live_holds(&mut *tx, account).await?;
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
            expires_at: Utc::now() + self.options.reservation_ttl_chrono(),
        };

        sqlx::query(
            "INSERT INTO ledger_reservations (id, account_id, amount, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(reservation.id.as_uuid())
        .bind(account.as_uuid())
        .bind(amount)
        .bind(reservation.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;

        tracing::debug!(%account, reservation = %reservation.id, %amount, "funds reserved");
        Ok(reservation)
    }

    async fn release_funds(
        &self,
        account: LedgerAccountId,
        reservation: ReservationId,
    ) -> Result<(), LedgerError> {
        simulate_latency(self.options.max_latency).await;

        sqlx::query(
            r#"
            UPDATE ledger_reservations SET released_at = NOW()
            WHERE id = $1 AND account_id = $2 AND released_at IS NULL
            "#,
        )
        .bind(reservation.as_uuid())
        .bind(account.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }
}
