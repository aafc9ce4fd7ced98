//! Idempotency cache port.

use std::time::Duration;

use crate::error::CacheError;

/// Shared, lossy key-value cache. Entries may vanish at any time.
#[async_trait::async_trait]
pub trait IdempotencyCache: Send + Sync + 'static {
    /// Returns `Ok(None)` on a miss; errors are reserved for real failures.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}
