//! # Validation Module
//!
//! Per-field checkers and the two-phase partial update built on them.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (catalog-api)                                   │
//! │  ├── Content-Type must be application/json                             │
//! │  └── Body must parse as JSON                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Phase 1: run the checker of every present key, in field order    │
//! │  └── Phase 2: apply the checked values (only if phase 1 passed)       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints (price)                                      │
//! │  └── UNIQUE constraints (name)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use catalog_core::validation::{check_price, check_rating};
//! use serde_json::json;
//!
//! assert_eq!(check_price(&json!(20)).unwrap(), 20.0);
//! assert!(check_price(&json!(200.0)).is_err());
//! assert_eq!(check_rating(&json!(null)).unwrap(), None);
//! ```

use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::Product;
use crate::{
    MAX_CATEGORY_LENGTH, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MAX_PRICE, MAX_RATE, MIN_PRICE,
    MIN_RATE,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// JSON type name used in error messages.
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid_type(field: &str, expected: &'static str, value: &Value) -> ValidationError {
    ValidationError::InvalidType {
        field: field.to_string(),
        expected,
        found: json_type(value),
    }
}

fn as_string<'a>(field: &str, value: &'a Value) -> ValidationResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| invalid_type(field, "string", value))
}

fn check_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

fn check_number_range(field: &str, value: &Value, min: f64, max: f64) -> ValidationResult<f64> {
    let number = value
        .as_f64()
        .ok_or_else(|| invalid_type(field, "float", value))?;

    if !(min..=max).contains(&number) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value: number,
        });
    }

    Ok(number)
}

// =============================================================================
// Field Checkers
// =============================================================================

/// Checks a product name.
///
/// ## Rules
/// - Must be a string
/// - Must not be empty
/// - At most 63 characters
pub fn check_name(value: &Value) -> ValidationResult<String> {
    let name = as_string("name", value)?;

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    check_length("name", name, MAX_NAME_LENGTH)?;

    Ok(name.to_string())
}

/// Checks a description. Empty strings are allowed.
pub fn check_description(value: &Value) -> ValidationResult<String> {
    let description = as_string("description", value)?;
    check_length("description", description, MAX_DESCRIPTION_LENGTH)?;
    Ok(description.to_string())
}

/// Checks a category.
///
/// ## Rules
/// - Must be a string
/// - Must not be empty
/// - At most 63 characters
pub fn check_category(value: &Value) -> ValidationResult<String> {
    let category = as_string("category", value)?;

    if category.is_empty() {
        return Err(ValidationError::Required {
            field: "category".to_string(),
        });
    }
    check_length("category", category, MAX_CATEGORY_LENGTH)?;

    Ok(category.to_string())
}

/// Checks a price.
///
/// Integers and floats are both accepted and returned as `f64`.
///
/// ## Example
/// ```rust
/// use catalog_core::validation::check_price;
/// use serde_json::json;
///
/// assert_eq!(check_price(&json!(10)).unwrap(), 10.0);
/// assert_eq!(check_price(&json!(100.0)).unwrap(), 100.0);
/// assert!(check_price(&json!(9.99)).is_err());
/// assert!(check_price(&json!("12")).is_err());
/// ```
pub fn check_price(value: &Value) -> ValidationResult<f64> {
    check_number_range("price", value, MIN_PRICE, MAX_PRICE)
}

/// Checks the availability flag.
pub fn check_available(value: &Value) -> ValidationResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| invalid_type("available", "boolean", value))
}

/// Checks a stored rating. `null` clears the rating.
pub fn check_rating(value: &Value) -> ValidationResult<Option<f64>> {
    if value.is_null() {
        return Ok(None);
    }
    check_number_range("rating", value, MIN_RATE, MAX_RATE).map(Some)
}

/// Checks the rating counter: a non-negative JSON integer.
pub fn check_no_of_users_rated(value: &Value) -> ValidationResult<i64> {
    let count = match value {
        Value::Number(n) if !n.is_f64() => n.as_i64(),
        _ => None,
    }
    .ok_or_else(|| invalid_type("no_of_users_rated", "integer", value))?;

    if count < 0 {
        return Err(ValidationError::Negative {
            field: "no_of_users_rated".to_string(),
            value: count as f64,
        });
    }

    Ok(count)
}

/// Checks the rating sum: any non-negative number.
pub fn check_cumulative_ratings(value: &Value) -> ValidationResult<f64> {
    let sum = value
        .as_f64()
        .ok_or_else(|| invalid_type("cumulative_ratings", "float", value))?;

    if sum < 0.0 {
        return Err(ValidationError::Negative {
            field: "cumulative_ratings".to_string(),
            value: sum,
        });
    }

    Ok(sum)
}

// =============================================================================
// Product Patch
// =============================================================================

/// A fully checked partial update.
///
/// Each field is `Some` only when its key was present in the source body.
/// `rating` is doubly optional: `Some(None)` means "clear the rating".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub available: Option<bool>,
    pub rating: Option<Option<f64>>,
    pub no_of_users_rated: Option<i64>,
    pub cumulative_ratings: Option<f64>,
}

fn check_key<T>(
    data: &Map<String, Value>,
    key: &str,
    checker: fn(&Value) -> ValidationResult<T>,
) -> CoreResult<Option<T>> {
    data.get(key)
        .map(checker)
        .transpose()
        .map_err(CoreError::InvalidProduct)
}

impl ProductPatch {
    /// Checks every present key of a JSON object.
    ///
    /// Fields are checked in a fixed order (name, description, category,
    /// price, available, rating, no_of_users_rated, cumulative_ratings) and
    /// the first failure is returned. `id` and unknown keys are ignored.
    pub fn from_json(data: &Value) -> CoreResult<Self> {
        let data = data.as_object().ok_or(CoreError::InvalidBody)?;

        Ok(ProductPatch {
            name: check_key(data, "name", check_name)?,
            description: check_key(data, "description", check_description)?,
            category: check_key(data, "category", check_category)?,
            price: check_key(data, "price", check_price)?,
            available: check_key(data, "available", check_available)?,
            rating: check_key(data, "rating", check_rating)?,
            no_of_users_rated: check_key(data, "no_of_users_rated", check_no_of_users_rated)?,
            cumulative_ratings: check_key(data, "cumulative_ratings", check_cumulative_ratings)?,
        })
    }

    /// Returns true if no key was present.
    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }

    /// Returns true if any of the three rating fields was present.
    pub fn touches_ratings(&self) -> bool {
        self.rating.is_some()
            || self.no_of_users_rated.is_some()
            || self.cumulative_ratings.is_some()
    }

    /// Writes the checked values onto `product`.
    ///
    /// Does not reconcile the rating fields; see `Product::apply_json`.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = Some(name);
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(category) = self.category {
            product.category = Some(category);
        }
        if let Some(price) = self.price {
            product.price = Some(price);
        }
        if let Some(available) = self.available {
            product.available = available;
        }
        if let Some(rating) = self.rating {
            product.rating = rating;
        }
        if let Some(count) = self.no_of_users_rated {
            product.no_of_users_rated = count;
        }
        if let Some(sum) = self.cumulative_ratings {
            product.cumulative_ratings = sum;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_name() {
        assert_eq!(check_name(&json!("Mug")).unwrap(), "Mug");
        assert!(matches!(
            check_name(&json!("")),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            check_name(&json!(42)),
            Err(ValidationError::InvalidType { .. })
        ));
        assert!(check_name(&json!("a".repeat(63))).is_ok());
        assert!(check_name(&json!("a".repeat(64))).is_err());
    }

    #[test]
    fn test_check_description() {
        assert_eq!(check_description(&json!("")).unwrap(), "");
        assert!(check_description(&json!("d".repeat(63))).is_ok());
        assert!(matches!(
            check_description(&json!("d".repeat(64))),
            Err(ValidationError::TooLong { max: 63, .. })
        ));
        assert!(check_description(&json!(null)).is_err());
    }

    #[test]
    fn test_check_category() {
        assert_eq!(check_category(&json!("kitchen")).unwrap(), "kitchen");
        assert!(check_category(&json!("")).is_err());
        assert!(check_category(&json!("c".repeat(64))).is_err());
        assert!(check_category(&json!(["kitchen"])).is_err());
    }

    #[test]
    fn test_check_price_accepts_range_inclusive() {
        for price in [10.0, 10.01, 55.5, 99.99, 100.0] {
            assert_eq!(check_price(&json!(price)).unwrap(), price);
        }
        assert_eq!(check_price(&json!(42)).unwrap(), 42.0);
    }

    #[test]
    fn test_check_price_rejects() {
        for price in [9.99, 100.01, 0.0, -5.0] {
            assert!(matches!(
                check_price(&json!(price)),
                Err(ValidationError::OutOfRange { .. })
            ));
        }
        for bad in [json!("20"), json!(true), json!(null)] {
            assert!(matches!(
                check_price(&bad),
                Err(ValidationError::InvalidType { .. })
            ));
        }
    }

    #[test]
    fn test_check_available() {
        assert!(check_available(&json!(true)).unwrap());
        assert!(!check_available(&json!(false)).unwrap());
        assert!(check_available(&json!("yes")).is_err());
        assert!(check_available(&json!(1)).is_err());
    }

    #[test]
    fn test_check_rating() {
        assert_eq!(check_rating(&json!(null)).unwrap(), None);
        assert_eq!(check_rating(&json!(0)).unwrap(), Some(0.0));
        assert_eq!(check_rating(&json!(3.7)).unwrap(), Some(3.7));
        assert_eq!(check_rating(&json!(5)).unwrap(), Some(5.0));
        assert!(check_rating(&json!(5.1)).is_err());
        assert!(check_rating(&json!(-0.5)).is_err());
        assert!(check_rating(&json!("4")).is_err());
    }

    #[test]
    fn test_check_no_of_users_rated() {
        assert_eq!(check_no_of_users_rated(&json!(0)).unwrap(), 0);
        assert_eq!(check_no_of_users_rated(&json!(12)).unwrap(), 12);
        assert!(matches!(
            check_no_of_users_rated(&json!(-1)),
            Err(ValidationError::Negative { .. })
        ));
        assert!(check_no_of_users_rated(&json!(1.5)).is_err());
        assert!(check_no_of_users_rated(&json!(2.0)).is_err());
        assert!(check_no_of_users_rated(&json!("3")).is_err());
    }

    #[test]
    fn test_patch_only_present_keys() {
        let patch = ProductPatch::from_json(&json!({"price": 20})).unwrap();
        assert_eq!(patch.price, Some(20.0));
        assert_eq!(patch.name, None);
        assert_eq!(patch.rating, None);

        let patch = ProductPatch::from_json(&json!({"rating": null})).unwrap();
        assert_eq!(patch.rating, Some(None));
    }

    #[test]
    fn test_patch_first_failure_wins() {
        let err = ProductPatch::from_json(&json!({
            "available": "yes",
            "category": "",
        }))
        .unwrap_err();

        match err {
            CoreError::InvalidProduct(cause) => assert_eq!(cause.field(), "category"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_patch_rejects_non_object() {
        assert!(matches!(
            ProductPatch::from_json(&json!([1, 2])),
            Err(CoreError::InvalidBody)
        ));
        assert!(ProductPatch::from_json(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_patch_ignores_unknown_and_identity_keys() {
        let patch = ProductPatch::from_json(&json!({
            "id": 99,
            "colour": "red",
        }))
        .unwrap();
        assert!(patch.is_empty());
        assert!(!patch.touches_ratings());
    }

    #[test]
    fn test_check_cumulative_ratings() {
        assert_eq!(check_cumulative_ratings(&json!(0)).unwrap(), 0.0);
        assert_eq!(check_cumulative_ratings(&json!(6.5)).unwrap(), 6.5);
        assert!(matches!(
            check_cumulative_ratings(&json!(-1)),
            Err(ValidationError::Negative { .. })
        ));
        assert!(matches!(
            check_cumulative_ratings(&json!("6")),
            Err(ValidationError::InvalidType { .. })
        ));
        assert!(check_cumulative_ratings(&json!(null)).is_err());
    }

    #[test]
    fn test_patch_reads_cumulative_ratings() {
        let patch = ProductPatch::from_json(&json!({"cumulative_ratings": 9})).unwrap();
        assert_eq!(patch.cumulative_ratings, Some(9.0));
        assert!(patch.touches_ratings());
    }

    #[test]
    fn test_apply_clears_rating() {
        let mut product = Product {
            rating: Some(4.0),
            ..Product::default()
        };
        ProductPatch::from_json(&json!({"rating": null}))
            .unwrap()
            .apply_to(&mut product);
        assert_eq!(product.rating, None);
    }
}
