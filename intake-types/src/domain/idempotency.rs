//! Cached outcome of an idempotency key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TransactionId;
use super::transaction::TransactionStatus;
use crate::dto::CreateTransactionResponse;

/// Short-lived snapshot of what processing an idempotency key produced.
///
/// The transaction store stays authoritative; this only short-circuits replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyCacheEntry {
    pub transaction_id: TransactionId,
    pub status: TransactionStatus,
    /// The serialized response returned to the original caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IdempotencyCacheEntry {
    /// Builds an entry that replays `response` verbatim.
    pub fn for_response(response: &CreateTransactionResponse) -> Self {
        Self {
            transaction_id: response.transaction_id,
            status: response.status,
            response: serde_json::to_value(response).ok(),
            created_at: response.created_at,
            completed_at: None,
            error: None,
        }
    }

    /// Response rebuilt from the entry's own id/status/timestamp.
    pub fn metadata_response(&self) -> CreateTransactionResponse {
        CreateTransactionResponse {
            transaction_id: self.transaction_id,
            status: self.status,
            created_at: self.created_at,
        }
    }

    /// The stored response, if present and well-formed.
    pub fn stored_response(&self) -> Option<Result<CreateTransactionResponse, serde_json::Error>> {
        self.response
            .as_ref()
            .map(|raw| serde_json::from_value(raw.clone()))
    }
}
