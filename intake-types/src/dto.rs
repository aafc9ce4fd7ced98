//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AccountId, TransactionId, TransactionStatus};
use crate::error::AppError;

/// Longest idempotency key accepted at the boundary.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

// ─────────────────────────────────────────────────────────────────────────────
// Transaction intake
// ─────────────────────────────────────────────────────────────────────────────

/// Request to move money out of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    /// Client-chosen key; resubmitting it replays the original result
    #[schema(example = "order-1234-attempt")]
    pub idempotency_key: String,
    /// Funds source
    pub from_account_id: AccountId,
    /// Destination account; omit for external settlement targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<AccountId>,
    /// Decimal amount in major units
    #[schema(value_type = String, example = "25.00")]
    pub amount: Decimal,
    /// ISO-style three-letter code
    #[schema(example = "USD")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl CreateTransactionRequest {
    /// Shape checks that need no IO. Currency policy runs later, in the pipeline.
    pub fn validate(&self) -> Result<(), AppError> {
        let key = self.idempotency_key.trim();
        if key.is_empty() {
            return Err(AppError::Validation("idempotency_key is required".into()));
        }
        if self.idempotency_key.chars().count() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(AppError::Validation(format!(
                "idempotency_key cannot exceed {} characters",
                MAX_IDEMPOTENCY_KEY_LEN
            )));
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::Validation(
                "currency must be a three-letter code".into(),
            ));
        }

        if self.amount < Decimal::ZERO {
            return Err(AppError::Validation("amount cannot be negative".into()));
        }

        Ok(())
    }
}

/// Result of an accepted (or replayed) transaction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateTransactionResponse {
    pub transaction_id: TransactionId,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Response envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Error details in a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "VALIDATION_ERROR")]
    pub code: String,
    pub message: String,
}

/// Uniform wrapper for every intake response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}
