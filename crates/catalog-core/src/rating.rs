//! # Rating Aggregation
//!
//! Incremental running average over rating submissions.
//!
//! ## Update Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit(r)   r ∈ {1, 2, 3, 4, 5}                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  no_of_users_rated  += 1                                               │
//! │  cumulative_ratings += r                                               │
//! │  rating              = cumulative_ratings / no_of_users_rated          │
//! │                                                                         │
//! │  fresh ─► submit(4) ─► (1, 4, 4.0) ─► submit(2) ─► (2, 6, 3.0)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is a read-modify-write over two correlated fields. The pure step
//! lives here; `catalog-db` wraps it in a version-checked update so two
//! concurrent submissions cannot both start from the same tally.
//!
//! Request bodies may also set the tally directly. `reconcile_ratings`
//! keeps `rating == cumulative_ratings / no_of_users_rated` true for
//! whatever combination of the three fields a body supplies.

use crate::error::ValidationError;
use crate::types::Product;
use crate::MAX_RATE;

/// Allowed drift between a supplied rating and the average it implies.
const AVERAGE_TOLERANCE: f64 = 1e-9;

/// Lowest accepted rating submission.
pub const MIN_SUBMISSION: i64 = 1;

/// Highest accepted rating submission.
pub const MAX_SUBMISSION: i64 = 5;

/// A single user's rating, guaranteed to be an integer in `1..=5`.
///
/// Stricter than a stored rating, which may be any float in `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingSubmission(i64);

impl RatingSubmission {
    /// Validates a raw submission.
    ///
    /// ## Example
    /// ```rust
    /// use catalog_core::RatingSubmission;
    ///
    /// assert!(RatingSubmission::new(5).is_ok());
    /// assert!(RatingSubmission::new(0).is_err());
    /// assert!(RatingSubmission::new(6).is_err());
    /// ```
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if !(MIN_SUBMISSION..=MAX_SUBMISSION).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: "rating".to_string(),
                min: MIN_SUBMISSION as f64,
                max: MAX_SUBMISSION as f64,
                value: value as f64,
            });
        }
        Ok(RatingSubmission(value))
    }

    /// Returns the submitted value.
    #[inline]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl Product {
    /// Folds one submission into the running average.
    ///
    /// A counter at zero (or a negative one left by a bad import) restarts
    /// the tally from this submission.
    pub fn record_rating(&mut self, submission: RatingSubmission) {
        let value = submission.value() as f64;

        if self.no_of_users_rated <= 0 {
            self.no_of_users_rated = 1;
        } else {
            self.no_of_users_rated += 1;
        }

        if self.cumulative_ratings == 0.0 {
            self.cumulative_ratings = value;
        } else {
            self.cumulative_ratings += value;
        }

        self.rating = Some(self.cumulative_ratings / self.no_of_users_rated as f64);
    }

    /// Restores the average invariant after the rating fields were set
    /// from a request body.
    ///
    /// ## Rules
    /// - Count of 0: the sum must be 0 (a missing sum is reset to 0)
    /// - Sum supplied: the rating is `sum / count`; a supplied rating must match it
    /// - Sum not supplied: the sum becomes `rating * count`; the rating is required
    ///
    /// ## Example
    /// ```rust
    /// use catalog_core::Product;
    ///
    /// let mut product = Product {
    ///     rating: Some(4.0),
    ///     no_of_users_rated: 1,
    ///     ..Product::default()
    /// };
    /// product.reconcile_ratings(false).unwrap();
    /// assert_eq!(product.cumulative_ratings, 4.0);
    /// ```
    pub fn reconcile_ratings(&mut self, sum_supplied: bool) -> Result<(), ValidationError> {
        if self.no_of_users_rated == 0 {
            if sum_supplied && self.cumulative_ratings != 0.0 {
                return Err(inconsistent(
                    "cumulative_ratings",
                    "must be 0 when no_of_users_rated is 0",
                ));
            }
            self.cumulative_ratings = 0.0;
            return Ok(());
        }

        let count = self.no_of_users_rated as f64;

        if !sum_supplied {
            let rating = self.rating.ok_or_else(|| {
                inconsistent("rating", "required when no_of_users_rated is above 0")
            })?;
            self.cumulative_ratings = rating * count;
            return Ok(());
        }

        let average = self.cumulative_ratings / count;
        if average > MAX_RATE {
            return Err(inconsistent(
                "cumulative_ratings",
                &format!("average {average} exceeds {MAX_RATE}"),
            ));
        }

        match self.rating {
            Some(rating) if (rating - average).abs() > AVERAGE_TOLERANCE => Err(inconsistent(
                "rating",
                &format!("expected {average} (cumulative_ratings / no_of_users_rated)"),
            )),
            _ => {
                self.rating = Some(average);
                Ok(())
            }
        }
    }
}

fn inconsistent(field: &str, reason: &str) -> ValidationError {
    ValidationError::Inconsistent {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
