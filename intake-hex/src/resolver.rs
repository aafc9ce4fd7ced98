//! Idempotency Resolver.
//!
//! Answers "has this key been accepted already?" from the cache first and the
//! transaction store second. The cache is never trusted to be complete: any
//! cache problem falls through to the store.

use std::sync::Arc;
use std::time::Duration;

use intake_types::{
    AppError, CreateTransactionResponse, IdempotencyCache, IdempotencyCacheEntry,
    TransactionStore,
};

/// Namespace for idempotency entries in the shared cache.
pub const CACHE_KEY_PREFIX: &str = "idempotency:";

pub fn cache_key(idempotency_key: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, idempotency_key)
}

pub struct IdempotencyResolver {
    cache: Arc<dyn IdempotencyCache>,
    store: Arc<dyn TransactionStore>,
    ttl: Duration,
}

impl IdempotencyResolver {
    pub fn new(
        cache: Arc<dyn IdempotencyCache>,
        store: Arc<dyn TransactionStore>,
        ttl: Duration,
    ) -> Self {
        Self { cache, store, ttl }
    }

    /// Returns the previously produced response for `key`, or `None` when the
    /// request should be processed fresh.
    pub async fn resolve(&self, key: &str) -> Result<Option<CreateTransactionResponse>, AppError> {
        if let Some(response) = self.from_cache(key).await {
            tracing::debug!(idempotency_key = key, "replaying cached response");
            return Ok(Some(response));
        }

        let existing = self
            .store
            .find_by_idempotency_key(key)
            .await
            .map_err(|e| AppError::from(e).context("idempotency lookup"))?;

        match existing {
            Some(tx) => {
                tracing::debug!(
                    idempotency_key = key,
                    transaction_id = %tx.id,
                    "replaying persisted transaction"
                );
                let response = CreateTransactionResponse {
                    transaction_id: tx.id,
                    status: tx.status,
                    created_at: tx.created_at,
                };
                self.remember(key, &response).await;
                Ok(Some(response))
            }
            None => Ok(None),
        }
    }

    /// Caches `response` for `key`. Failures are logged, never returned.
    pub async fn remember(&self, key: &str, response: &CreateTransactionResponse) {
        let entry = IdempotencyCacheEntry::for_response(response);
        let value = match serde_json::to_string(&entry) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(idempotency_key = key, error = %e, "failed to encode cache entry");
                return;
            }
        };

        if let Err(e) = self.cache.set(&cache_key(key), &value, self.ttl).await {
            tracing::warn!(idempotency_key = key, error = %e, "failed to cache idempotency result");
        }
    }

    async fn from_cache(&self, key: &str) -> Option<CreateTransactionResponse> {
        let raw = match self.cache.get(&cache_key(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(idempotency_key = key, error = %e, "idempotency cache unavailable");
                return None;
            }
        };

        let entry: IdempotencyCacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(idempotency_key = key, error = %e, "unreadable idempotency cache entry");
                return None;
            }
        };

        match entry.stored_response() {
            Some(Ok(response)) => Some(response),
            Some(Err(e)) => {
                tracing::warn!(
                    idempotency_key = key,
                    error = %e,
                    "malformed cached response, rebuilding from entry metadata"
                );
                Some(entry.metadata_response())
            }
            None => Some(entry.metadata_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_namespaced() {
        assert_eq!(cache_key("k1"), "idempotency:k1");
    }
}
