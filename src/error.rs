//! Error types for the catalog server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::renewal::RenewalError;

/// Stable numeric codes reported to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthenticated = 2,
    PermissionDenied = 3,
    DbFailure = 4,
    NotFound = 5,
    BadValue = 6,
    PastDateError = 7,
    TooFarAheadError = 8,
    InvalidState = 9,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Renewal(#[from] RenewalError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status and code the presentation layer reports for this error
    pub fn classify(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthenticated),
            AppError::PermissionDenied(_) => (StatusCode::FORBIDDEN, ErrorCode::PermissionDenied),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::InvalidState(_) => (StatusCode::CONFLICT, ErrorCode::InvalidState),
            AppError::Renewal(RenewalError::PastDate) => {
                (StatusCode::BAD_REQUEST, ErrorCode::PastDateError)
            }
            AppError::Renewal(RenewalError::TooFarAhead { .. }) => {
                (StatusCode::BAD_REQUEST, ErrorCode::TooFarAheadError)
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Authentication(msg)
            | AppError::PermissionDenied(msg)
            | AppError::NotFound(msg)
            | AppError::InvalidState(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::Renewal(e) => e.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// PostgreSQL foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let fk_violation = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == FOREIGN_KEY_VIOLATION);
        if fk_violation {
            // A referenced record vanished between the service check and the write
            AppError::NotFound(format!("Referenced record not found: {}", err))
        } else {
            AppError::Database(err)
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
