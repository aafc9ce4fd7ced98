//! In-process adapters.
//!
//! They keep the contracts the pipeline relies on (unique idempotency keys,
//! atomic per-account reservations, queue deduplication), which makes them
//! usable for concurrency tests and local runs without infrastructure.

mod cache;
mod ledger;
mod queue;
mod store;

pub use cache::MemoryCache;
pub use ledger::MemoryLedger;
pub use queue::MemoryQueue;
pub use store::MemoryStore;
