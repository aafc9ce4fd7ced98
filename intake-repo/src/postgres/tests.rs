//! PostgreSQL adapter integration tests.
//!
//! Run with `TEST_DATABASE_URL=postgres://... cargo test -p intake-repo
//! --features postgres -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::PgPool;

use intake_types::{
    Ledger, LedgerError, MessageQueue, NewTransaction, QueueError, QueueName, RepoError,
    ReservationId, TransactionStatus, TransactionStore,
};

use super::{PostgresLedger, PostgresQueue, PostgresStore, Schema, connect};
use crate::LedgerOptions;

async fn setup_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    connect(&url, &Schema::ALL).await.unwrap()
}

fn unique_key(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

#[test]
fn test_each_schema_creates_only_its_own_tables() {
    let tables = |schema: Schema| -> String {
        schema
            .migrations()
            .iter()
            .map(|(_, sql)| *sql)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let store = tables(Schema::Store);
    assert!(store.contains("TABLE IF NOT EXISTS accounts"));
    assert!(store.contains("TABLE IF NOT EXISTS transactions"));
    assert!(!store.contains("ledger_accounts"));
    assert!(!store.contains("queue_messages"));

    let ledger = tables(Schema::Ledger);
    assert!(ledger.contains("TABLE IF NOT EXISTS ledger_accounts"));
    assert!(!ledger.contains("TABLE IF NOT EXISTS accounts"));
    assert!(!ledger.contains("transactions"));

    let queue = tables(Schema::Queue);
    assert!(queue.contains("TABLE IF NOT EXISTS queue_messages"));
    assert!(!queue.contains("accounts"));
    assert!(!queue.contains("transactions"));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_create_and_find_by_idempotency_key() {
    let pool = setup_pool().await;
    let store = PostgresStore::new(pool.clone());
    let ledger = PostgresLedger::new(pool, LedgerOptions::instant());

    let ledger_account = ledger.open_account(Decimal::new(1000, 0), "active").await.unwrap();
    let from = store.create_account("Alice", ledger_account).await.unwrap();

    let key = unique_key("find");
    let new_tx = NewTransaction::pending(
        key.clone(),
        from,
        None,
        Decimal::new(1050, 2),
        "USD".to_string(),
        ReservationId::new(),
    )
    .with_description(Some("rent".to_string()));

    let (id, _) = store.create(&new_tx).await.unwrap();
    let found = store.find_by_idempotency_key(&key).await.unwrap().unwrap();

    assert_eq!(found.id, id);
    assert_eq!(found.amount, Decimal::new(1050, 2));
    assert_eq!(found.status, TransactionStatus::Pending);
    assert_eq!(found.description.as_deref(), Some("rent"));
    assert_eq!(
        store.external_ledger_account_id(from).await.unwrap(),
        Some(ledger_account)
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_duplicate_key_is_reported_as_duplicate() {
    let pool = setup_pool().await;
    let store = PostgresStore::new(pool.clone());
    let ledger = PostgresLedger::new(pool, LedgerOptions::instant());

    let ledger_account = ledger.open_account(Decimal::new(1000, 0), "active").await.unwrap();
    let from = store.create_account("Alice", ledger_account).await.unwrap();

    let new_tx = NewTransaction::pending(
        unique_key("dup"),
        from,
        None,
        Decimal::ONE,
        "USD".to_string(),
        ReservationId::new(),
    );

    store.create(&new_tx).await.unwrap();
    let second = store.create(&new_tx).await;

    assert!(matches!(second, Err(RepoError::DuplicateKey(_))));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_concurrent_reservations_never_overdraw() {
    let pool = setup_pool().await;
    let ledger = Arc::new(PostgresLedger::new(pool, LedgerOptions::instant()));
    let account = ledger.open_account(Decimal::new(100, 0), "active").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger.reserve_funds(account, Decimal::new(30, 0)).await
        }));
    }

    let mut granted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => granted += 1,
            Err(LedgerError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(granted, 3);
    assert!(!ledger.has_sufficient_funds(account, Decimal::new(11, 0)).await.unwrap());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_release_restores_available_balance() {
    let pool = setup_pool().await;
    let ledger = PostgresLedger::new(pool, LedgerOptions::instant());
    let account = ledger.open_account(Decimal::new(50, 0), "active").await.unwrap();

    let hold = ledger.reserve_funds(account, Decimal::new(50, 0)).await.unwrap();
    assert!(!ledger.has_sufficient_funds(account, Decimal::ONE).await.unwrap());

    ledger.release_funds(account, hold.id).await.unwrap();
    ledger.release_funds(account, hold.id).await.unwrap();

    assert!(ledger.has_sufficient_funds(account, Decimal::new(50, 0)).await.unwrap());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_frozen_account_is_rejected() {
    let pool = setup_pool().await;
    let ledger = PostgresLedger::new(pool, LedgerOptions::instant());
    let account = ledger.open_account(Decimal::new(50, 0), "frozen").await.unwrap();

    let result = ledger.reserve_funds(account, Decimal::ONE).await;

    assert!(matches!(result, Err(LedgerError::AccountInactive { .. })));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_queue_dedupes_and_leases() {
    let pool = setup_pool().await;
    let queue = PostgresQueue::new(pool, Duration::from_secs(30));

    // Isolate from other runs by using a fresh dedupe key.
    let dedupe = unique_key("dedupe");
    let first = queue
        .send(QueueName::Notification, "{}", &dedupe, "notification")
        .await
        .unwrap();
    let second = queue
        .send(QueueName::Notification, "{}", &dedupe, "notification")
        .await
        .unwrap();
    assert_eq!(first, second);

    let leased = queue.receive(QueueName::Notification, 100).await.unwrap();
    let mine = leased
        .iter()
        .find(|m| m.message_id == first)
        .expect("message should be leased");
    assert_eq!(mine.receive_count, 1);

    queue
        .delete(QueueName::Notification, &mine.receipt_handle)
        .await
        .unwrap();
    let again = queue
        .delete(QueueName::Notification, &mine.receipt_handle)
        .await;
    assert!(matches!(again, Err(QueueError::UnknownReceipt(_))));
}
