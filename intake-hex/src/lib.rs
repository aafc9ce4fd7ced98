//! # Intake Hex
//!
//! Application layer and HTTP adapter for the transaction intake service.
//!
//! ## Architecture
//!
//! - `resolver` - Idempotency Resolver (cache, then store)
//! - `funds` - Funds Reservation Coordinator (ledger pre-check, hold, release)
//! - `dispatcher` - Settlement Dispatcher (queue producer)
//! - `service` - Transaction Intake Orchestrator composing the above
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Every collaborator receives its ports as `Arc<dyn Port>`, so adapters are
//! chosen at startup and tests can inject in-memory doubles.

pub mod dispatcher;
pub mod funds;
pub mod inbound;
pub mod openapi;
pub mod resolver;
pub mod service;


pub use dispatcher::SettlementDispatcher;
pub use funds::FundsCoordinator;
pub use resolver::IdempotencyResolver;
pub use service::{IntakeConfig, IntakeService};
