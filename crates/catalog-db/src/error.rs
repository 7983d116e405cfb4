//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Classifies constraint failures                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in catalog-api) ← HTTP status + JSON body                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} with id '{id}' was not found")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate product name).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A NOT NULL column was left empty (e.g. a product without a price).
    #[error("Required field not provided: {field}")]
    NotNullViolation { field: String },

    /// A CHECK constraint rejected the row.
    #[error("Constraint check failed: {message}")]
    CheckViolation { message: String },

    /// Creating a record failed for a reason other than a constraint.
    #[error("Something happened when creating new {entity}: {message}")]
    CreateFailed { entity: String, message: String },

    /// Update was called on a record that was never persisted.
    #[error("Update called with empty ID field")]
    MissingId,

    /// Optimistic concurrency retries were exhausted.
    #[error("{entity} {id} was modified concurrently; gave up after {attempts} attempts")]
    Conflict {
        entity: String,
        id: String,
        attempts: u32,
    },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for failures the caller can fix by changing the submitted data.
    pub fn is_data_validation(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::NotNullViolation { .. }
                | DbError::CheckViolation { .. }
                | DbError::CreateFailed { .. }
                | DbError::MissingId
        )
    }
}

/// Extracts the column from "<KIND> constraint failed: <table>.<column>".
fn constraint_column(message: &str) -> String {
    message
        .rsplit_once("constraint failed: ")
        .map(|(_, target)| target)
        .and_then(|target| target.split(',').next())
        .map(|target| {
            target
                .trim()
                .rsplit_once('.')
                .map_or(target.trim(), |(_, column)| column)
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Classified by constraint kind
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: constraint_column(msg),
                        value: "unknown".to_string(),
                    },
                    ErrorKind::NotNullViolation => DbError::NotNullViolation {
                        field: constraint_column(msg),
                    },
                    ErrorKind::CheckViolation => DbError::CheckViolation {
                        message: msg.to_string(),
                    },
                    _ => DbError::QueryFailed(msg.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
