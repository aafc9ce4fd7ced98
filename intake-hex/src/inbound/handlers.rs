//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use intake_types::{
    ApiEnvelope, AppError, CreateTransactionRequest, CreateTransactionResponse, ErrorKind,
};

use crate::IntakeService;

/// Application state shared across handlers.
pub struct AppState {
    pub service: IntakeService,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(AppError::Validation(rejection.body_text()))
    }
}

/// Stable kind to status mapping.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::DuplicateKey => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let message = match kind {
            ErrorKind::Internal => {
                tracing::error!(error = %self.0, "request failed");
                "internal server error".to_string()
            }
            _ => self.0.message().to_string(),
        };

        let body = ApiEnvelope::<()>::err(kind.code(), message);
        (status_for(kind), Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Accept a transaction (or replay the one already accepted for its key).
#[tracing::instrument(skip(state, payload), fields(idempotency_key = tracing::field::Empty))]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiEnvelope<CreateTransactionResponse>>), ApiError> {
    let Json(req) = payload?;
    tracing::Span::current().record("idempotency_key", req.idempotency_key.as_str());
    let response = state.service.create_transaction(req).await?;
    Ok((StatusCode::CREATED, Json(ApiEnvelope::ok(response))))
}
