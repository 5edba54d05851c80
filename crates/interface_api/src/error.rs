//! API error handling
//!
//! Every domain error maps onto one HTTP status with a `{ error, message }`
//! body. Storage failures answer 503 so clients know a retry may succeed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_analytics::AnalyticsError;
use domain_billing::LedgerError;
use domain_catalog::CatalogError;
use domain_inventory::InventoryError;
use domain_patient::PatientError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg),
            ApiError::ServiceUnavailable(msg) => {
                error!(message = %msg, "storage unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
            ApiError::Internal(msg) => {
                error!(message = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(msg) => ApiError::NotFound(msg),
            PatientError::Validation(msg) => ApiError::Validation(msg),
            PatientError::IdentifierConflict(msg) | PatientError::Conflict(msg) => ApiError::Conflict(msg),
            PatientError::StorageUnavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::NotFound(msg) => ApiError::NotFound(msg),
            InventoryError::InsufficientStock { .. } => ApiError::Conflict(err.to_string()),
            InventoryError::Validation(msg) => ApiError::Validation(msg),
            InventoryError::IdentifierConflict(msg) | InventoryError::Conflict(msg) => ApiError::Conflict(msg),
            InventoryError::StorageUnavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(msg) => ApiError::NotFound(msg),
            CatalogError::Validation(msg) => ApiError::Validation(msg),
            CatalogError::IdentifierConflict(msg) | CatalogError::Conflict(msg) => ApiError::Conflict(msg),
            CatalogError::StorageUnavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(msg) => ApiError::NotFound(msg),
            LedgerError::InsufficientStock { .. } => ApiError::Conflict(err.to_string()),
            LedgerError::IdentifierConflict(msg) => ApiError::Conflict(msg),
            LedgerError::Validation(msg) => ApiError::Validation(msg),
            LedgerError::StorageUnavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidWindow(msg) => ApiError::Validation(msg),
            AnalyticsError::StorageUnavailable(msg) => ApiError::ServiceUnavailable(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenExpired => {
                ApiError::Unauthorized(err.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}
