//! # Domain Types
//!
//! The `Product` entity and its serialized shape.
//!
//! ## Field Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             Product                                     │
//! │                                                                         │
//! │  id                  i64, assigned by storage on create                 │
//! │  name                unique, ≤ 63 chars, non-empty when present         │
//! │  description         ≤ 63 chars, "unavailable" by default               │
//! │  category            ≤ 63 chars, non-empty when present                 │
//! │  price               10.00 ..= 100.00                                   │
//! │  available           false by default                                   │
//! │  rating              0 ..= 5 or null                                    │
//! │  no_of_users_rated   count of rating submissions                        │
//! │  cumulative_ratings  sum of rating submissions                          │
//! │  version             internal concurrency token (never serialized)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `id` and `price` are `Option` because a freshly deserialized product has
//! not been persisted yet and may not carry a price; storage rejects a
//! missing price with a not-null violation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{CoreError, CoreResult};
use crate::validation::ProductPatch;
use crate::DEFAULT_DESCRIPTION;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Storage-assigned identity. `None` until created.
    pub id: Option<i64>,

    /// Display name, unique across products.
    pub name: Option<String>,

    /// Free-text description.
    pub description: String,

    /// Category used for filtering.
    pub category: Option<String>,

    /// Unit price.
    pub price: Option<f64>,

    /// Whether the product can currently be ordered.
    pub available: bool,

    /// Average of all rating submissions, or `None` when unrated.
    pub rating: Option<f64>,

    /// Number of rating submissions received.
    pub no_of_users_rated: i64,

    /// Sum of all rating submissions.
    pub cumulative_ratings: f64,

    /// Optimistic concurrency token, bumped by storage on every write.
    #[serde(skip)]
    pub version: i64,
}

impl Default for Product {
    fn default() -> Self {
        Product {
            id: None,
            name: None,
            description: DEFAULT_DESCRIPTION.to_string(),
            category: None,
            price: None,
            available: false,
            rating: None,
            no_of_users_rated: 0,
            cumulative_ratings: 0.0,
            version: 0,
        }
    }
}

impl Product {
    /// Validates `data` and applies every key it contains.
    ///
    /// All present keys are checked before anything is written, so a failed
    /// call leaves `self` exactly as it was. When the body touches any of
    /// `rating`, `no_of_users_rated` or `cumulative_ratings`, the result must
    /// still satisfy `rating == cumulative_ratings / no_of_users_rated`
    /// (see [`Product::reconcile_ratings`]).
    ///
    /// ## Example
    /// ```rust
    /// use catalog_core::Product;
    /// use serde_json::json;
    ///
    /// let mut product = Product::default();
    /// assert!(product.apply_json(&json!({"name": "Mug", "price": 500})).is_err());
    /// assert_eq!(product.name, None);
    /// ```
    pub fn apply_json(&mut self, data: &Value) -> CoreResult<&mut Self> {
        let patch = ProductPatch::from_json(data)?;
        let touches_ratings = patch.touches_ratings();
        let sum_supplied = patch.cumulative_ratings.is_some();

        let mut next = self.clone();
        patch.apply_to(&mut next);
        if touches_ratings {
            next.reconcile_ratings(sum_supplied)
                .map_err(CoreError::InvalidProduct)?;
        }

        *self = next;
        Ok(self)
    }

    /// Builds a new, unsaved product from a request body.
    pub fn from_json(data: &Value) -> CoreResult<Self> {
        let mut product = Product::default();
        product.apply_json(data)?;
        Ok(product)
    }

    /// Serializes into the public JSON shape.
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "category": self.category,
            "price": self.price,
            "available": self.available,
            "rating": self.rating,
            "no_of_users_rated": self.no_of_users_rated,
            "cumulative_ratings": self.cumulative_ratings,
        })
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("<unnamed>");
        match self.id {
            Some(id) => write!(f, "<Product {name:?} id=[{id}]>"),
            None => write!(f, "<Product {name:?} id=[None]>"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> Value {
        json!({
            "name": "Desk Lamp",
            "description": "LED, warm white",
            "category": "lighting",
            "price": 34.5,
            "available": true,
            "rating": 4.5,
            "no_of_users_rated": 2,
        })
    }

    #[test]
    fn test_defaults() {
        let product = Product::default();
        assert_eq!(product.description, "unavailable");
        assert!(!product.available);
        assert_eq!(product.no_of_users_rated, 0);
        assert_eq!(product.rating, None);
        assert_eq!(product.id, None);
    }

    #[test]
    fn test_round_trip_preserves_present_keys() {
        let body = sample_body();
        let product = Product::from_json(&body).unwrap();
        let out = product.to_json();

        for (key, value) in body.as_object().unwrap() {
            assert_eq!(&out[key], value, "key {key} changed");
        }
    }

    #[test]
    fn test_round_trip_of_full_serialized_shape() {
        let mut product = Product::from_json(&json!({
            "name": "Kettle",
            "category": "kitchen",
            "price": 35,
            "available": true,
        }))
        .unwrap();
        for value in [4, 2, 5] {
            product.record_rating(crate::RatingSubmission::new(value).unwrap());
        }

        let out = product.to_json();
        assert_eq!(out["cumulative_ratings"], 11.0);

        let back = Product::from_json(&out).unwrap();
        assert_eq!(back, product);
        assert_eq!(back.to_json(), out);
    }

    #[test]
    fn test_body_counters_keep_average_consistent() {
        let product = Product::from_json(&json!({
            "name": "Lamp",
            "price": 30,
            "rating": 4,
            "no_of_users_rated": 1,
        }))
        .unwrap();
        assert_eq!(product.cumulative_ratings, 4.0);

        let err = Product::from_json(&json!({
            "name": "Lamp",
            "price": 30,
            "rating": 4,
            "no_of_users_rated": 2,
            "cumulative_ratings": 6,
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidProduct(crate::ValidationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_failed_reconcile_leaves_product_untouched() {
        let mut product = Product::from_json(&sample_body()).unwrap();
        let before = product.clone();

        assert!(product.apply_json(&json!({"rating": null})).is_err());
        assert_eq!(product, before);
    }

    #[test]
    fn test_serialized_shape_hides_version() {
        let mut product = Product::from_json(&sample_body()).unwrap();
        product.version = 7;

        let out = product.to_json();
        assert!(out.get("version").is_none());
        let derived = serde_json::to_value(&product).unwrap();
        assert!(derived.get("version").is_none());
        assert_eq!(out, derived);
    }

    #[test]
    fn test_failed_apply_leaves_product_untouched() {
        let mut product = Product::from_json(&sample_body()).unwrap();
        let before = product.clone();

        // name is fine, price is not: nothing may be applied
        let result = product.apply_json(&json!({"name": "Floor Lamp", "price": 250.0}));

        assert!(result.is_err());
        assert_eq!(product, before);
    }

    #[test]
    fn test_display() {
        let mut product = Product::from_json(&json!({"name": "Mug"})).unwrap();
        assert_eq!(product.to_string(), "<Product \"Mug\" id=[None]>");
        product.id = Some(3);
        assert_eq!(product.to_string(), "<Product \"Mug\" id=[3]>");
    }
}
