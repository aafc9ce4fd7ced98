//! In-memory transaction store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use intake_types::{
    AccountId, LedgerAccountId, NewTransaction, RepoError, Transaction, TransactionId,
    TransactionStore,
};

/// Store backed by concurrent maps. The transactions map is keyed by
/// idempotency key, and insertion goes through the entry API so two racing
/// creates cannot both win.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<AccountId, LedgerAccountId>,
    transactions: DashMap<String, Transaction>,
    fail_creates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an internal account mapped to `ledger_account`.
    pub fn add_account(&self, ledger_account: LedgerAccountId) -> AccountId {
        let id = AccountId::new();
        self.accounts.insert(id, ledger_account);
        id
    }

    /// Makes every subsequent `create` fail with a database error.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Number of persisted transactions.
    pub fn count(&self) -> usize {
        self.transactions.len()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create(
        &self,
        tx: &NewTransaction,
    ) -> Result<(TransactionId, DateTime<Utc>), RepoError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(RepoError::Database("store write failed".into()));
        }

        match self.transactions.entry(tx.idempotency_key.clone()) {
            Entry::Occupied(_) => Err(RepoError::DuplicateKey(tx.idempotency_key.clone())),
            Entry::Vacant(slot) => {
                let id = TransactionId::new();
                let created_at = Utc::now();
                slot.insert(Transaction::from_new(tx.clone(), id, created_at));
                Ok((id, created_at))
            }
        }
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>, RepoError> {
        Ok(self.transactions.get(key).map(|tx| tx.value().clone()))
    }

    async fn account_exists(&self, id: AccountId) -> Result<bool, RepoError> {
        Ok(self.accounts.contains_key(&id))
    }

    async fn external_ledger_account_id(
        &self,
        id: AccountId,
    ) -> Result<Option<LedgerAccountId>, RepoError> {
        Ok(self.accounts.get(&id).map(|ledger| *ledger.value()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use intake_types::ReservationId;

    fn new_tx(store: &MemoryStore, key: &str) -> NewTransaction {
        let from = store.add_account(LedgerAccountId::new());
        NewTransaction::pending(
            key.to_string(),
            from,
            None,
            Decimal::ONE,
            "USD".to_string(),
            ReservationId::new(),
        )
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let store = MemoryStore::new();
        let tx = new_tx(&store, "k1");

        let (id, created_at) = store.create(&tx).await.unwrap();
        let found = store.find_by_idempotency_key("k1").await.unwrap().unwrap();

        assert_eq!(found.id, id);
        assert_eq!(found.created_at, created_at);
        assert_eq!(found.updated_at, created_at);
    }

    #[tokio::test]
    async fn test_second_create_is_duplicate() {
        let store = MemoryStore::new();
        let tx = new_tx(&store, "k1");

        store.create(&tx).await.unwrap();
        let second = store.create(&tx).await;

        assert!(matches!(second, Err(RepoError::DuplicateKey(key)) if key == "k1"));
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        let tx = new_tx(&store, "k1");
        store.fail_creates(true);

        assert!(matches!(store.create(&tx).await, Err(RepoError::Database(_))));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_account_mapping() {
        let store = MemoryStore::new();
        let ledger = LedgerAccountId::new();
        let account = store.add_account(ledger);

        assert!(store.account_exists(account).await.unwrap());
        assert!(!store.account_exists(AccountId::new()).await.unwrap());
        assert_eq!(
            store.external_ledger_account_id(account).await.unwrap(),
            Some(ledger)
        );
    }
}
