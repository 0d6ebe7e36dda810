use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::pipeline::session::PipelineError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input caught before any remote call. Never moves a pipeline to `Error`.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested transition is not allowed in the session's current stage.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    /// Gated operation attempted on a locked document.
    #[error("Payment required")]
    PaymentRequired,

    #[error("Payment failed: {0}")]
    Payment(String),

    #[error("AI gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::PaymentRequired => (
                StatusCode::PAYMENT_REQUIRED,
                "PAYMENT_REQUIRED",
                "Unlock the document to export or copy it".to_string(),
            ),
            AppError::Payment(msg) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED", msg.clone()),
            AppError::Gateway(e) => {
                tracing::error!("AI gateway error: {e}");
                let code = match e {
                    GatewayError::Upstream(_) => "UPSTREAM_ERROR",
                    GatewayError::MalformedResponse(_) => "MALFORMED_RESPONSE",
                    GatewayError::EmptyOutput => "EMPTY_OUTPUT",
                    GatewayError::InvalidRequest(_) => "VALIDATION_ERROR",
                };
                let status = match e {
                    GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::BAD_GATEWAY,
                };
                // The raw gateway message is meant for the user.
                (status, code, e.to_string())
            }
            AppError::Store(StoreError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Optimization {id} not found"),
            ),
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    "The record store is currently unavailable".to_string(),
                )
            }
            AppError::Conversion(msg) => {
                tracing::error!("Conversion error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONVERSION_ERROR",
                    msg.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Locked => AppError::PaymentRequired,
            PipelineError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
        }
    }
}
