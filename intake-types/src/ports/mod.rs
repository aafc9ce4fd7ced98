//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod cache;
mod ledger;
mod queue;
mod store;

pub use cache::IdempotencyCache;
pub use ledger::Ledger;
pub use queue::{MessageQueue, QueueName, ReceivedMessage};
pub use store::TransactionStore;
