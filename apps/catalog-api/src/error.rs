//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Catalog API                        │
//! │                                                                         │
//! │  CoreError::InvalidProduct / InvalidBody        ──► 400 Bad Request    │
//! │  non-integer path id (PathRejection)            ──► 400 Bad Request    │
//! │  DbError::{UniqueViolation, NotNullViolation,                          │
//! │           CheckViolation, CreateFailed, MissingId} ──► 400 Bad Request │
//! │  DbError::NotFound                              ──► 404 Not Found      │
//! │  field endpoint / list filter rejections        ──► 406 Not Acceptable │
//! │  DbError::Conflict                              ──► 409 Conflict       │
//! │  wrong Content-Type                             ──► 415 Unsupported    │
//! │  anything else                                  ──► 500 Internal       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error response carries the same JSON body:
//! ```json
//! { "status": 404, "error": "Not Found", "message": "Product with id '7' was not found" }
//! ```

use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use catalog_core::CoreError;
use catalog_db::DbError;

/// API error returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NotAcceptable(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            err if err.is_data_validation() => ApiError::BadRequest(err.to_string()),
            err => {
                error!(error = %err, "Storage failure");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            warn!(status = status.as_u16(), message = %self, "Request rejected");
        }

        let body = json!({
            "status": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}
