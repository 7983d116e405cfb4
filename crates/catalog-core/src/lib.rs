//! # catalog-core: Pure Business Logic for the Product Catalog
//!
//! This crate holds the business rules of the catalog as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Product Catalog Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  catalog-api (axum handlers)                    │   │
//! │  │    POST /products ──► PUT /products/{id}/rating ──► ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ catalog-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐    ┌─────────────┐    ┌─────────────┐          │   │
//! │  │   │   types   │    │ validation  │    │   rating    │          │   │
//! │  │   │  Product  │    │ checkers    │    │ aggregation │          │   │
//! │  │   │           │    │ ProductPatch│    │             │          │   │
//! │  │   └───────────┘    └─────────────┘    └─────────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 catalog-db (Storage Layer)                      │   │
//! │  │          SQLite queries, migrations, ProductRepository          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - The `Product` entity and its serialized shape
//! - [`validation`] - Per-field checkers and two-phase partial updates
//! - [`rating`] - Running-average rating aggregation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use catalog_core::{Product, RatingSubmission};
//! use serde_json::json;
//!
//! let mut product = Product::default();
//! product
//!     .apply_json(&json!({"name": "Desk Lamp", "price": 25}))
//!     .unwrap();
//! assert_eq!(product.price, Some(25.0));
//!
//! product.record_rating(RatingSubmission::new(4).unwrap());
//! product.record_rating(RatingSubmission::new(2).unwrap());
//! assert_eq!(product.rating, Some(3.0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod rating;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use rating::RatingSubmission;
pub use types::Product;
pub use validation::ProductPatch;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Lowest accepted product price.
pub const MIN_PRICE: f64 = 10.00;

/// Highest accepted product price.
pub const MAX_PRICE: f64 = 100.00;

/// Lowest value a stored rating may hold.
pub const MIN_RATE: f64 = 0.0;

/// Highest value a stored rating may hold.
pub const MAX_RATE: f64 = 5.0;

/// Maximum length of `name`, in characters.
pub const MAX_NAME_LENGTH: usize = 63;

/// Maximum length of `description`, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 63;

/// Maximum length of `category`, in characters.
pub const MAX_CATEGORY_LENGTH: usize = 63;

/// Description stored when none is supplied.
pub const DEFAULT_DESCRIPTION: &str = "unavailable";
