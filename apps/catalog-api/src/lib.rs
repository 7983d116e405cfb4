//! # Catalog API
//!
//! REST server for the product catalog.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Catalog API Server                             │
//! │                                                                         │
//! │  HTTP client ───► axum Router ───► routes::products ───► catalog-db     │
//! │                        │                 │                  (SQLite)    │
//! │                        │                 ▼                              │
//! │                        │           catalog-core                         │
//! │                        │      (validation, rating math)                 │
//! │                        ▼                                                │
//! │                 error::ApiError ───► JSON error body + status           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary in `main.rs` only loads configuration, opens the database and
//! serves [`build_app`]. Tests build the same router against an in-memory
//! database.

use axum::Router;

use catalog_db::Database;

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

pub use config::{ApiConfig, ConfigError};
pub use error::ApiError;

/// Builds the full application router over `db`.
pub fn build_app(db: Database) -> Router {
    routes::router().with_state(db)
}
