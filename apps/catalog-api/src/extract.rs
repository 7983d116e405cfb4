//! Request helpers shared by the write endpoints.
//!
//! Write endpoints take the raw body as `Bytes` instead of `Json<T>` so the
//! media type check, the existence check and the JSON parse can run in the
//! order the API documents: 415, then 404, then 400/406.
//!
//! [`ProductId`] replaces `Path<i64>` so a malformed id gets the same JSON
//! error body as every other rejection.

use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path};
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde_json::Value;
use tracing::error;

use crate::error::ApiError;

/// The only accepted media type for request bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

const FALLBACK_BASE_URL: &str = "http://localhost";

/// Product id taken from the `{id}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductId(pub i64);

impl<S> FromRequestParts<S> for ProductId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state).await?;
        Ok(ProductId(id))
    }
}

/// Rejects the request unless `Content-Type` is exactly `application/json`.
///
/// Parameters such as `; charset=utf-8` are not accepted.
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    match content_type {
        Some(JSON_MEDIA_TYPE) => Ok(()),
        other => {
            error!(content_type = ?other, "Invalid Content-Type");
            Err(ApiError::UnsupportedMediaType(format!(
                "Content-Type must be {}",
                JSON_MEDIA_TYPE
            )))
        }
    }
}

/// Parses a request body as JSON.
pub fn parse_json(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {}", e)))
}

/// Media type check followed by the parse.
pub fn json_body(headers: &HeaderMap, body: &Bytes) -> Result<Value, ApiError> {
    require_json(headers)?;
    parse_json(body)
}

/// External base URL of the service, built from the `Host` header.
pub fn base_url(headers: &HeaderMap) -> String {
    headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .map(|host| format!("http://{}", host))
        .unwrap_or_else(|| FALLBACK_BASE_URL.to_string())
}
