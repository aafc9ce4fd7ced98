//! # Intake Repository
//!
//! Concrete adapters for the intake ports:
//! - `postgres` - transaction store, mock ledger and durable queue on PostgreSQL
//! - `redis` - idempotency cache
//! - `memory` - in-process doubles honoring the same atomicity contracts

#[cfg(not(any(feature = "postgres", feature = "memory")))]
compile_error!("Enable a store feature: `postgres` or `memory`.");

#[cfg(any(feature = "postgres", feature = "memory"))]
mod simulation;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "redis")]
pub mod redis;

#[cfg(any(feature = "postgres", feature = "memory"))]
pub use simulation::LedgerOptions;

#[cfg(feature = "memory")]
pub use memory::{MemoryCache, MemoryLedger, MemoryQueue, MemoryStore};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresLedger, PostgresQueue, PostgresStore, Schema, connect};
#[cfg(feature = "redis")]
pub use redis::RedisCache;
