//! HTTP API error type.
//!
//! Everything a handler can fail with collapses into [`ApiError`]: an error
//! code (which fixes the HTTP status) plus a human message rendered into
//! the standard `{success: false, message}` envelope.
//!
//! ## Error Flow
//! ```text
//! ValidationError ─┐
//! CoreError ───────┼──► DbError ──► ApiError ──► (status, JSON) ──► client
//! sqlx::Error ─────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::response::ApiResponse;
use minimart_core::{CoreError, ValidationError};
use minimart_db::DbError;

/// Error categories, each with a fixed HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    Conflict,
    InsufficientStock,
    InvalidState,
    ValidationFailed,
    DiscountUnavailable,
    Unauthorized,
    Forbidden,
    Internal,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InsufficientStock => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidState => StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::DiscountUnavailable => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What the client sees when a request fails.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{entity} not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationFailed, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();

        // 5xx details go to the log, not the client
        let message = if status.is_server_error() {
            error!(message = %self.message, "Internal error");
            "Internal server error".to_string()
        } else {
            self.message
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::DiscountUnavailable { .. } => ErrorCode::DiscountUnavailable,
            CoreError::InvalidState { .. } => ErrorCode::InvalidState,
            CoreError::HasDependents { .. } => ErrorCode::Conflict,
            CoreError::Validation(_) => ErrorCode::ValidationFailed,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            DbError::ForeignKeyViolation { .. } => {
                ApiError::new(ErrorCode::ValidationFailed, err.to_string())
            }
            DbError::Domain(core) => core.into(),
            other => ApiError::internal(other.to_string()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::InsufficientStock {
            product: "Water".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Product", "p-1").into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = DbError::duplicate("barcode", "123").into();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err: ApiError = DbError::Domain(CoreError::DiscountUnavailable {
            name: "Promo".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::DiscountUnavailable);
    }
}
