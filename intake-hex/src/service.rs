//! Transaction Intake Orchestrator
//!
//! Runs one request through the pipeline:
//! idempotency check, account validation, balance pre-check, currency policy,
//! reservation, persistence (with race reconciliation), caching, enqueue.
//! Contains NO infrastructure logic - every side effect goes through a port.

use std::sync::Arc;
use std::time::Duration;

use intake_types::{
    AccountId, AppError, CreateTransactionRequest, CreateTransactionResponse, CurrencyPolicy,
    FundsReservation, IdempotencyCache, Ledger, LedgerAccountId, MessageQueue, NewTransaction,
    RepoError, TransactionStore,
};

use crate::dispatcher::{DEFAULT_OPERATION, SettlementDispatcher};
use crate::funds::FundsCoordinator;
use crate::resolver::IdempotencyResolver;

/// Pipeline tuning.
#[derive(Debug, Clone, Copy)]
pub struct IntakeConfig {
    /// Deadline for one request, covering every port call it makes
    pub request_timeout: Duration,
    /// How long an accepted result stays in the idempotency cache
    pub idempotency_ttl: Duration,
    pub currency: CurrencyPolicy,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            idempotency_ttl: Duration::from_secs(24 * 60 * 60),
            currency: CurrencyPolicy::USD,
        }
    }
}

/// Application service for transaction intake.
///
/// Holds no cross-request state: every coordination point (uniqueness,
/// balance holds, queue dedupe) lives in the shared backends, so any number
/// of instances can run side by side.
pub struct IntakeService {
    store: Arc<dyn TransactionStore>,
    resolver: IdempotencyResolver,
    funds: FundsCoordinator,
    dispatcher: SettlementDispatcher,
    config: IntakeConfig,
}

impl IntakeService {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        ledger: Arc<dyn Ledger>,
        cache: Arc<dyn IdempotencyCache>,
        queue: Arc<dyn MessageQueue>,
        config: IntakeConfig,
    ) -> Self {
        Self {
            resolver: IdempotencyResolver::new(cache, store.clone(), config.idempotency_ttl),
            funds: FundsCoordinator::new(ledger),
            dispatcher: SettlementDispatcher::new(queue),
            store,
            config,
        }
    }

    /// The settlement producer, for follow-up messages such as notifications.
    pub fn dispatcher(&self) -> &SettlementDispatcher {
        &self.dispatcher
    }

    /// Accepts a transaction, or replays the result already produced for its
    /// idempotency key.
    #[tracing::instrument(
        skip(self, req),
        fields(idempotency_key = %req.idempotency_key, amount = %req.amount, currency = %req.currency)
    )]
    pub async fn create_transaction(
        &self,
        req: CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, AppError> {
        match tokio::time::timeout(self.config.request_timeout, self.process(req)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.request_timeout.as_millis() as u64,
                    "request deadline exceeded"
                );
                Err(AppError::Internal("request deadline exceeded".into()))
            }
        }
    }

    async fn process(
        &self,
        req: CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, AppError> {
        req.validate()?;
        let key = req.idempotency_key.clone();

        if let Some(previous) = self.resolver.resolve(&key).await? {
            return Ok(previous);
        }

        let ledger_account = self.validate_accounts(&req).await?;

        let policy = self.config.currency;
        let reservation = self
            .funds
            .check_and_reserve(ledger_account, req.amount, || {
                policy.validate(&req.currency, req.amount)
            })
            .await?;

        let new_tx = NewTransaction::pending(
            key.clone(),
            req.from_account_id,
            req.to_account_id,
            req.amount,
            req.currency,
            reservation.id,
        )
        .with_description(req.description)
        .with_metadata(req.metadata.map(serde_json::Value::Object));

        let response = match self.store.create(&new_tx).await {
            Ok((transaction_id, created_at)) => CreateTransactionResponse {
                transaction_id,
                status: new_tx.status,
                created_at,
            },
            Err(RepoError::DuplicateKey(_)) => {
                return self.adopt_winner(&key, &reservation).await;
            }
            Err(e) => {
                self.funds.release(&reservation).await;
                return Err(AppError::from(e).context("persist transaction"));
            }
        };

        tracing::info!(transaction_id = %response.transaction_id, "transaction created");
        self.resolver.remember(&key, &response).await;

        if let Err(e) = self
            .dispatcher
            .enqueue_transaction(response.transaction_id, &key, DEFAULT_OPERATION)
            .await
        {
            tracing::error!(
                transaction_id = %response.transaction_id,
                idempotency_key = %key,
                error = %e,
                "transaction persisted but not enqueued for settlement"
            );
            return Err(e);
        }

        Ok(response)
    }

    /// Checks both accounts and resolves the source's ledger account.
    async fn validate_accounts(
        &self,
        req: &CreateTransactionRequest,
    ) -> Result<LedgerAccountId, AppError> {
        self.ensure_account(req.from_account_id).await?;
        if let Some(to) = req.to_account_id {
            self.ensure_account(to).await?;
        }

        self.store
            .external_ledger_account_id(req.from_account_id)
            .await
            .map_err(|e| AppError::from(e).context("ledger account lookup"))?
            .ok_or_else(|| AppError::NotFound("ledger account not found".into()))
    }

    async fn ensure_account(&self, id: AccountId) -> Result<(), AppError> {
        let exists = self
            .store
            .account_exists(id)
            .await
            .map_err(|e| AppError::from(e).context("account lookup"))?;
        if !exists {
            return Err(AppError::NotFound(format!("account {} not found", id)));
        }
        Ok(())
    }

    /// Lost the insert race: drop our hold and answer with the winner's record.
    async fn adopt_winner(
        &self,
        key: &str,
        reservation: &FundsReservation,
    ) -> Result<CreateTransactionResponse, AppError> {
        tracing::info!(idempotency_key = key, "lost insert race, adopting persisted transaction");
        self.funds.release(reservation).await;

        let winner = self
            .store
            .find_by_idempotency_key(key)
            .await
            .map_err(|e| AppError::from(e).context("race resolution"))?
            .ok_or_else(|| {
                AppError::Internal("duplicate key reported but no transaction found".into())
            })?;

        let response = CreateTransactionResponse {
            transaction_id: winner.id,
            status: winner.status,
            created_at: winner.created_at,
        };
        self.resolver.remember(key, &response).await;
        Ok(response)
    }
}
