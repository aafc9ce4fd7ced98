//! Error types for the intake service.
//!
//! Each port has its own error; `AppError` is what the request boundary sees.
//! The `From` impls below are the single place a port failure gets its kind,
//! so the same failure maps to the same caller-visible status everywhere.

use rust_decimal::Decimal;

use crate::domain::LedgerAccountId;

/// Caller-visible failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-policy input
    Validation,
    /// Unknown account or reservation target
    NotFound,
    /// Inactive account, or insufficient funds at reservation time
    Forbidden,
    /// Uniqueness race at persistence; resolved internally
    DuplicateKey,
    /// Unexpected downstream failure
    Internal,
}

impl ErrorKind {
    /// Stable wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Transaction store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// External ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger account not found: {0}")]
    AccountNotFound(LedgerAccountId),

    #[error("Ledger account {account} is {status}")]
    AccountInactive {
        account: LedgerAccountId,
        status: String,
    },

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Idempotency cache failures. A miss is not an error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// Settlement queue failures.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    #[error("Queue serialization error: {0}")]
    Serialization(String),

    #[error("Unknown receipt handle: {0}")]
    UnknownReceipt(String),
}

/// Application-level errors (for the request boundary).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::DuplicateKey(_) => ErrorKind::DuplicateKey,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Forbidden(msg)
            | Self::DuplicateKey(msg)
            | Self::Internal(msg) => msg,
        }
    }

    /// Prefixes the message with `context`. The kind never changes.
    pub fn context(self, context: &str) -> Self {
        let wrap = |msg: String| format!("{}: {}", context, msg);
        match self {
            Self::Validation(msg) => Self::Validation(wrap(msg)),
            Self::NotFound(msg) => Self::NotFound(wrap(msg)),
            Self::Forbidden(msg) => Self::Forbidden(wrap(msg)),
            Self::DuplicateKey(msg) => Self::DuplicateKey(wrap(msg)),
            Self::Internal(msg) => Self::Internal(wrap(msg)),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::DuplicateKey(msg) => AppError::DuplicateKey(msg),
            RepoError::Database(msg) => AppError::Internal(msg),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(_) => AppError::NotFound("account not found".into()),
            LedgerError::AccountInactive { status, .. } => {
                AppError::Forbidden(format!("account {}", status))
            }
            LedgerError::InsufficientFunds { .. } => {
                AppError::Forbidden("insufficient funds".into())
            }
            LedgerError::Unavailable(msg) => AppError::Internal(msg),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        AppError::Internal(err.to_string())
    }
}
