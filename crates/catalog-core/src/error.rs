//! # Error Types
//!
//! Domain-specific error types for catalog-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  catalog-core errors (this file)                                       │
//! │  ├── ValidationError  - A single field checker failed                  │
//! │  └── CoreError        - Whole-body failures (wraps ValidationError)    │
//! │                                                                         │
//! │  catalog-db errors (separate crate)                                    │
//! │  └── DbError          - Storage failures (unique, not-null, ...)       │
//! │                                                                         │
//! │  catalog-api errors (in app)                                           │
//! │  └── ApiError         - HTTP status + JSON body                        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP client            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised while turning a request body into product state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A product body failed one of the field checkers.
    ///
    /// This is the single data-validation failure reported for a
    /// deserialization attempt; the first failing field wins.
    #[error("Invalid Product: body of request contained bad or no data - Error message: {0}")]
    InvalidProduct(#[source] ValidationError),

    /// The body was valid JSON but not an object.
    #[error("Invalid Product: body of request must be a JSON object")]
    InvalidBody,

    /// A rating submission was rejected.
    #[error("Invalid rating: {0}")]
    InvalidRating(#[source] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Per-field validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value has the wrong JSON type for the field.
    #[error("Invalid type for {expected} [{field}]: {found}")]
    InvalidType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A string field that must not be empty was empty.
    #[error("{field} field cannot be empty")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("Invalid range for [{field}]: {value} (expected {min} to {max})")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    /// Numeric value must not be negative.
    #[error("Invalid range for [{field}]: {value} (must not be negative)")]
    Negative { field: String, value: f64 },

    /// The rating fields disagree with each other.
    #[error("Inconsistent [{field}]: {reason}")]
    Inconsistent { field: String, reason: String },
}

impl ValidationError {
    /// Name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::InvalidType { field, .. }
            | ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::Negative { field, .. }
            | ValidationError::Inconsistent { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
