//! Error types for the response cache
//!
//! `CacheError` covers the caching layer and never reaches a client.
//! `ApiError` covers the host application's own handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Failures inside the caching layer.
///
/// The middleware logs these and falls back to pass-through.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Request attributes could not be turned into a key
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// The entry can never fit within the configured capacity
    #[error("Store capacity exceeded: {0}")]
    StoreCapacity(String),

    /// Internal bookkeeping no longer matches the stored entries
    #[error("Store corrupted: {0}")]
    StoreCorruption(String),
}

// == Api Error Enum ==
/// Errors returned by the application's HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request was well-formed but rejected by a validator
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::KeyDerivation(msg) => ApiError::InvalidRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Aliases ==
/// Result type for the caching layer.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
