//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Lifecycle: create, update, delete
//! - Queries: by id, name, category, price ceiling, rating floor, availability
//! - Single-field writes: price, description
//! - Rating aggregation with optimistic concurrency
//!
//! ## Rating Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Optimistic Read-Modify-Write                           │
//! │                                                                         │
//! │  Request A                          Request B                          │
//! │  read (n=1, sum=4, version=3)       read (n=1, sum=4, version=3)       │
//! │  record_rating(2)                   record_rating(5)                   │
//! │  UPDATE ... WHERE version = 3  ✓    UPDATE ... WHERE version = 3  ✗    │
//! │  (n=2, sum=6, version=4)            0 rows → re-read (version=4)       │
//! │                                     record_rating(5)                   │
//! │                                     UPDATE ... WHERE version = 4  ✓    │
//! │                                     (n=3, sum=11, version=5)           │
//! │                                                                         │
//! │  Every write bumps `version`, so no submission is silently lost.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `update` uses the same `WHERE version = ?` guard but does not retry: a
//! full overwrite built from a stale read fails with `DbError::Conflict`.
//!
//! None of the list queries promise an order. Callers that need sorted
//! output sort it themselves.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use catalog_core::{Product, RatingSubmission};

/// Upper bound on optimistic retries for one rating submission.
///
/// Each failed attempt means another writer committed in between, so this
/// also bounds how many concurrent writers one submission can outlast.
pub const MAX_RATING_ATTEMPTS: u32 = 16;

const ENTITY: &str = "Product";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let created = repo.create(&product).await?;
/// let rated = repo.rate(created_id, RatingSubmission::new(4)?).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Persists a new product and returns it with its assigned id.
    ///
    /// Any id already set on `product` is ignored; storage assigns a fresh one.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already taken
    /// * `Err(DbError::NotNullViolation)` - a required field (price) is missing
    /// * `Err(DbError::CreateFailed)` - any other storage failure
    pub async fn create(&self, product: &Product) -> DbResult<Product> {
        info!(name = ?product.name, "Creating product");

        let result = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, description, category, price, available,
                rating, no_of_users_rated, cumulative_ratings, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
            RETURNING *
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.available)
        .bind(product.rating)
        .bind(product.no_of_users_rated)
        .bind(product.cumulative_ratings)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => {
                debug!(id = ?created.id, "Product created");
                Ok(created)
            }
            Err(err) => Err(classify_create_error(product, DbError::from(err))),
        }
    }

    /// Overwrites the stored row with the in-memory state of `product`.
    ///
    /// The write only lands if the row still has `product.version`, the
    /// version that was read. Any write in between (a rating, a price
    /// change) makes this fail instead of being overwritten.
    ///
    /// ## Returns
    /// * `Err(DbError::MissingId)` - product was never created
    /// * `Err(DbError::NotFound)` - no row with that id
    /// * `Err(DbError::Conflict)` - the row changed since it was read
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        let id = product.id.ok_or(DbError::MissingId)?;
        info!(id, name = ?product.name, version = product.version, "Saving product");

        let saved = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                category = ?4,
                price = ?5,
                available = ?6,
                rating = ?7,
                no_of_users_rated = ?8,
                cumulative_ratings = ?9,
                version = version + 1
            WHERE id = ?1 AND version = ?10
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(product.available)
        .bind(product.rating)
        .bind(product.no_of_users_rated)
        .bind(product.cumulative_ratings)
        .bind(product.version)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(saved) = saved {
            return Ok(saved);
        }

        match self.find(id).await? {
            None => Err(DbError::not_found(ENTITY, id)),
            Some(current) => {
                warn!(
                    id,
                    read_version = product.version,
                    current_version = current.version,
                    "Product changed since it was read"
                );
                Err(DbError::Conflict {
                    entity: ENTITY.to_string(),
                    id: id.to_string(),
                    attempts: 1,
                })
            }
        }
    }

    /// Removes a product. Deleting a missing id is not an error.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        info!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(id, removed = result.rows_affected(), "Delete complete");
        Ok(())
    }

    // =========================================================================
    // Single-Field Writes
    // =========================================================================

    /// Sets the price of one product without touching its other columns.
    ///
    /// The caller is responsible for range-checking `price`.
    pub async fn update_price(&self, id: i64, price: f64) -> DbResult<Product> {
        debug!(id, price, "Updating price");

        sqlx::query_as::<_, Product>(
            "UPDATE products SET price = ?2, version = version + 1 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(price)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(ENTITY, id))
    }

    /// Sets the description of one product without touching its other columns.
    pub async fn update_description(&self, id: i64, description: &str) -> DbResult<Product> {
        debug!(id, description, "Updating description");

        sqlx::query_as::<_, Product>(
            "UPDATE products SET description = ?2, version = version + 1 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(ENTITY, id))
    }

    // =========================================================================
    // Rating Aggregation
    // =========================================================================

    /// Folds one rating submission into a product's running average.
    ///
    /// The update only lands if the row's `version` still matches the one
    /// that was read; otherwise the row is re-read and the submission is
    /// re-applied on top of the newer state.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - product missing (or deleted mid-retry)
    /// * `Err(DbError::Conflict)` - still contended after `MAX_RATING_ATTEMPTS`
    pub async fn rate(&self, id: i64, submission: RatingSubmission) -> DbResult<Product> {
        for attempt in 1..=MAX_RATING_ATTEMPTS {
            let mut product = self.find_or_404(id).await?;
            let read_version = product.version;
            product.record_rating(submission);

            let saved = sqlx::query_as::<_, Product>(
                r#"
                UPDATE products SET
                    rating = ?3,
                    no_of_users_rated = ?4,
                    cumulative_ratings = ?5,
                    version = version + 1
                WHERE id = ?1 AND version = ?2
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(read_version)
            .bind(product.rating)
            .bind(product.no_of_users_rated)
            .bind(product.cumulative_ratings)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(saved) = saved {
                info!(
                    id,
                    rating = ?saved.rating,
                    no_of_users_rated = saved.no_of_users_rated,
                    attempt,
                    "Rating recorded"
                );
                return Ok(saved);
            }

            debug!(id, attempt, read_version, "Rating lost a version race, retrying");
            tokio::task::yield_now().await;
        }

        warn!(id, attempts = MAX_RATING_ATTEMPTS, "Rating retries exhausted");
        Err(DbError::Conflict {
            entity: ENTITY.to_string(),
            id: id.to_string(),
            attempts: MAX_RATING_ATTEMPTS,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn find(&self, id: i64) -> DbResult<Option<Product>> {
        debug!(id, "Processing lookup");

        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its id, failing with `DbError::NotFound` if absent.
    pub async fn find_or_404(&self, id: i64) -> DbResult<Product> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found(ENTITY, id))
    }

    /// Returns all products with exactly this name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Vec<Product>> {
        debug!(name, "Processing name query");

        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE name = ?1")
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Returns all products in exactly this category.
    pub async fn find_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        debug!(category, "Processing category query");

        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE category = ?1")
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Returns all products priced at or below `ceiling`.
    pub async fn find_by_price(&self, ceiling: f64) -> DbResult<Vec<Product>> {
        debug!(ceiling, "Processing price query");

        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE price <= ?1")
            .bind(ceiling)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Returns all products rated at or above `floor`.
    ///
    /// Unrated products never compare as `>=` in SQL, so they are absent.
    pub async fn find_by_rating(&self, floor: f64) -> DbResult<Vec<Product>> {
        debug!(floor, "Processing rating query");

        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE rating >= ?1")
            .bind(floor)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Returns all products that are currently available.
    pub async fn find_by_availability(&self) -> DbResult<Vec<Product>> {
        debug!("Processing availability query");

        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE available = 1")
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Returns every product.
    pub async fn all(&self) -> DbResult<Vec<Product>> {
        debug!("Processing all products");

        let products = sqlx::query_as::<_, Product>("SELECT * FROM products")
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Maps a failed insert onto the error the caller should see.
fn classify_create_error(product: &Product, err: DbError) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } => {
            let value = product.name.clone().unwrap_or_default();
            warn!(%field, %value, "Duplicate product");
            DbError::duplicate(field, value)
        }
        DbError::NotNullViolation { field } => {
            warn!(%field, "Product missing a required field");
            DbError::NotNullViolation { field }
        }
        err @ DbError::CheckViolation { .. } => err,
        other => {
            warn!(error = %other, "Product creation failed");
            DbError::CreateFailed {
                entity: "product".to_string(),
                message: other.to_string(),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use serde_json::json;

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    fn product(name: &str, category: &str, price: f64) -> Product {
        Product::from_json(&json!({
            "name": name,
            "category": category,
            "price": price,
            "available": true,
        }))
        .unwrap()
    }

    fn ids(products: &[Product]) -> Vec<i64> {
        let mut ids: Vec<i64> = products.iter().filter_map(|p| p.id).collect();
        ids.sort_unstable();
        ids
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_id() {
        let repo = repo().await;
        let mut draft = product("Desk Lamp", "lighting", 34.5);
        draft.id = Some(999);

        let created = repo.create(&draft).await.unwrap();

        assert_ne!(created.id, Some(999));
        assert!(created.id.is_some());
        assert_eq!(created.name.as_deref(), Some("Desk Lamp"));
        assert_eq!(created.description, "unavailable");
        assert_eq!(created.price, Some(34.5));
        assert_eq!(created.version, 0);
    }

    #[tokio::test]
    async fn test_create_duplicate_name_is_unique_violation() {
        let repo = repo().await;
        repo.create(&product("Mug", "kitchen", 12.0)).await.unwrap();

        let err = repo
            .create(&product("Mug", "office", 15.0))
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "name");
                assert_eq!(value, "Mug");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_without_price_is_not_null_violation() {
        let repo = repo().await;
        let draft = Product::from_json(&json!({"name": "Priceless"})).unwrap();

        let err = repo.create(&draft).await.unwrap_err();

        assert!(
            matches!(&err, DbError::NotNullViolation { field } if field == "price"),
            "got {err:?}"
        );
        assert!(err.is_data_validation());
    }

    #[tokio::test]
    async fn test_unnamed_products_do_not_collide() {
        let repo = repo().await;
        let draft = Product::from_json(&json!({"price": 20.0})).unwrap();

        repo.create(&draft).await.unwrap();
        repo.create(&draft).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let repo = repo().await;
        let err = repo
            .update(&product("Ghost", "none", 20.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::MissingId));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let repo = repo().await;
        let mut ghost = product("Ghost", "none", 20.0);
        ghost.id = Some(41);

        let err = repo.update(&ghost).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_overwrites_and_bumps_version() {
        let repo = repo().await;
        let mut saved = repo.create(&product("Kettle", "kitchen", 40.0)).await.unwrap();

        saved
            .apply_json(&json!({"price": 45.0, "available": false}))
            .unwrap();
        let updated = repo.update(&saved).await.unwrap();

        assert_eq!(updated.price, Some(45.0));
        assert!(!updated.available);
        assert_eq!(updated.version, 1);

        let reread = repo.find_or_404(saved.id.unwrap()).await.unwrap();
        assert_eq!(reread, updated);
    }

    #[tokio::test]
    async fn test_update_from_stale_read_keeps_interleaved_rating() {
        let repo = repo().await;
        let saved = repo.create(&product("Kettle", "kitchen", 40.0)).await.unwrap();
        let id = saved.id.unwrap();

        let mut stale = repo.find_or_404(id).await.unwrap();
        repo.rate(id, RatingSubmission::new(5).unwrap()).await.unwrap();

        stale.apply_json(&json!({"available": false})).unwrap();
        let err = repo.update(&stale).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }), "got {err:?}");

        let current = repo.find_or_404(id).await.unwrap();
        assert_eq!(current.no_of_users_rated, 1);
        assert_eq!(current.cumulative_ratings, 5.0);
        assert_eq!(current.rating, Some(5.0));

        // a fresh read goes through
        let mut fresh = current;
        fresh.apply_json(&json!({"available": false})).unwrap();
        let updated = repo.update(&fresh).await.unwrap();
        assert!(!updated.available);
        assert_eq!(updated.no_of_users_rated, 1);
    }

    #[tokio::test]
    async fn test_rate_after_create_with_body_counters() {
        let repo = repo().await;
        let draft = Product::from_json(&json!({
            "name": "Lamp",
            "price": 30,
            "rating": 4,
            "no_of_users_rated": 1,
        }))
        .unwrap();

        let created = repo.create(&draft).await.unwrap();
        assert_eq!(created.cumulative_ratings, 4.0);

        let rated = repo
            .rate(created.id.unwrap(), RatingSubmission::new(2).unwrap())
            .await
            .unwrap();
        assert_eq!(rated.no_of_users_rated, 2);
        assert_eq!(rated.cumulative_ratings, 6.0);
        assert_eq!(rated.rating, Some(3.0));
    }

    #[tokio::test]
    async fn test_update_to_duplicate_name_fails() {
        let repo = repo().await;
        repo.create(&product("Mug", "kitchen", 12.0)).await.unwrap();
        let mut other = repo.create(&product("Cup", "kitchen", 11.0)).await.unwrap();

        other.name = Some("Mug".to_string());
        let err = repo.update(&other).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = repo().await;
        let saved = repo.create(&product("Kettle", "kitchen", 40.0)).await.unwrap();
        let id = saved.id.unwrap();

        repo.delete(id).await.unwrap();
        repo.delete(id).await.unwrap();
        repo.delete(12345).await.unwrap();

        assert_eq!(repo.find(id).await.unwrap(), None);
        assert!(matches!(
            repo.find_or_404(id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_by_price_is_inclusive_ceiling() {
        let repo = repo().await;
        let cheap = repo.create(&product("A", "x", 20.0)).await.unwrap();
        let edge = repo.create(&product("B", "x", 50.0)).await.unwrap();
        repo.create(&product("C", "x", 50.01)).await.unwrap();
        repo.create(&product("D", "x", 90.0)).await.unwrap();

        let found = repo.find_by_price(50.0).await.unwrap();

        assert_eq!(ids(&found), ids(&[cheap, edge]));
        assert!(found.iter().all(|p| p.price.unwrap() <= 50.0));
    }

    #[tokio::test]
    async fn test_find_by_rating_skips_unrated() {
        let repo = repo().await;
        let mut high = repo.create(&product("A", "x", 20.0)).await.unwrap();
        let mut low = repo.create(&product("B", "x", 20.0)).await.unwrap();
        repo.create(&product("C", "x", 20.0)).await.unwrap();

        high.rating = Some(4.5);
        low.rating = Some(2.0);
        let high = repo.update(&high).await.unwrap();
        repo.update(&low).await.unwrap();

        let found = repo.find_by_rating(3.0).await.unwrap();
        assert_eq!(ids(&found), ids(&[high]));
    }

    #[tokio::test]
    async fn test_find_by_category_name_and_availability() {
        let repo = repo().await;
        let lamp = repo.create(&product("Lamp", "lighting", 30.0)).await.unwrap();
        let bulb = repo.create(&product("Bulb", "lighting", 10.0)).await.unwrap();
        let mut pan = repo.create(&product("Pan", "kitchen", 25.0)).await.unwrap();
        pan.available = false;
        repo.update(&pan).await.unwrap();

        let lighting = repo.find_by_category("lighting").await.unwrap();
        assert_eq!(ids(&lighting), ids(&[lamp.clone(), bulb.clone()]));

        let named = repo.find_by_name("Pan").await.unwrap();
        assert_eq!(ids(&named), ids(&[pan]));

        let available = repo.find_by_availability().await.unwrap();
        assert_eq!(ids(&available), ids(&[lamp, bulb]));

        assert_eq!(repo.all().await.unwrap().len(), 3);
        assert!(repo.find_by_category("garden").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_field_writes() {
        let repo = repo().await;
        let saved = repo.create(&product("Lamp", "lighting", 30.0)).await.unwrap();
        let id = saved.id.unwrap();

        let priced = repo.update_price(id, 55.0).await.unwrap();
        assert_eq!(priced.price, Some(55.0));
        assert_eq!(priced.name.as_deref(), Some("Lamp"));

        let described = repo.update_description(id, "brass, 40W").await.unwrap();
        assert_eq!(described.description, "brass, 40W");
        assert_eq!(described.price, Some(55.0));
        assert_eq!(described.version, 2);

        assert!(matches!(
            repo.update_price(id + 100, 20.0).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_rate_four_then_two() {
        let repo = repo().await;
        let saved = repo.create(&product("Lamp", "lighting", 30.0)).await.unwrap();
        let id = saved.id.unwrap();

        repo.rate(id, RatingSubmission::new(4).unwrap()).await.unwrap();
        let rated = repo.rate(id, RatingSubmission::new(2).unwrap()).await.unwrap();

        assert_eq!(rated.no_of_users_rated, 2);
        assert_eq!(rated.cumulative_ratings, 6.0);
        assert_eq!(rated.rating, Some(3.0));
        assert_eq!(repo.find_or_404(id).await.unwrap(), rated);
    }

    #[tokio::test]
    async fn test_rate_missing_product() {
        let repo = repo().await;
        let err = repo
            .rate(7, RatingSubmission::new(3).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_ratings_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("ratings.db")).max_connections(4))
            .await
            .unwrap();
        let saved = db
            .products()
            .create(&product("Lamp", "lighting", 30.0))
            .await
            .unwrap();
        let id = saved.id.unwrap();

        let submissions: Vec<i64> = (0..12).map(|i| i % 5 + 1).collect();
        let handles: Vec<_> = submissions
            .iter()
            .map(|&value| {
                let repo = db.products();
                tokio::spawn(async move {
                    repo.rate(id, RatingSubmission::new(value).unwrap()).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rated = db.products().find_or_404(id).await.unwrap();
        let total: i64 = submissions.iter().sum();
        assert_eq!(rated.no_of_users_rated, submissions.len() as i64);
        assert_eq!(rated.cumulative_ratings, total as f64);
        assert_eq!(
            rated.rating,
            Some(total as f64 / submissions.len() as f64)
        );
    }
}
