//! # Product Endpoints
//!
//! ```text
//! GET    /products                     list (filters: category | price | rating | name | available)
//! POST   /products                     create                     201 + Location
//! GET    /products/{id}                retrieve                   200 | 404
//! PUT    /products/{id}                full update                200 | 404 | 400 | 409
//! DELETE /products/{id}                delete                     204 always
//! PUT    /products/{id}/rating         submit a 1..=5 rating      200 | 404 | 406
//! PUT    /products/{id}/price          set the price              200 | 404 | 406
//! PUT    /products/{id}/description    set the description        200 | 404 | 406
//! ```
//!
//! Only one list filter applies per request. When several are given the
//! first in the order above wins. A non-integer `{id}` is a 400.

use std::cmp::Ordering;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use catalog_core::validation::{check_description, check_price};
use catalog_core::{Product, RatingSubmission, MAX_RATE};
use catalog_db::Database;

use crate::error::ApiError;
use crate::extract::{base_url, json_body, parse_json, require_json, ProductId};

pub fn router() -> Router<Database> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/{id}/rating", put(rate_product))
        .route("/products/{id}/price", put(update_price))
        .route("/products/{id}/description", put(update_description))
}

fn products_json(products: &[Product]) -> Json<Vec<Value>> {
    Json(products.iter().map(Product::to_json).collect())
}

// =============================================================================
// Listing
// =============================================================================

/// Query string of `GET /products`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub name: Option<String>,
    pub available: Option<String>,
}

/// The single filter chosen for a list request.
#[derive(Debug, Clone, PartialEq)]
pub enum ListFilter {
    Category(String),
    PriceAtMost(f64),
    RatingAtLeast(f64),
    Name(String),
    Available(bool),
    None,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_number(raw: &str, field: &str) -> Result<f64, ApiError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ApiError::NotAcceptable(format!("{} must be a number", field)))
}

impl ListParams {
    /// Picks the filter by precedence and checks its value.
    pub fn filter(&self) -> Result<ListFilter, ApiError> {
        if let Some(category) = present(&self.category) {
            return Ok(ListFilter::Category(category.to_string()));
        }

        if let Some(raw) = present(&self.price) {
            let ceiling = parse_number(raw, "price")?;
            if ceiling < 0.0 {
                return Err(ApiError::NotAcceptable(
                    "price must not be negative".to_string(),
                ));
            }
            return Ok(ListFilter::PriceAtMost(ceiling));
        }

        if let Some(raw) = present(&self.rating) {
            let floor = parse_number(raw, "rating")?;
            if floor <= 0.0 || floor > MAX_RATE {
                return Err(ApiError::NotAcceptable(format!(
                    "rating must be in (0, {}]",
                    MAX_RATE
                )));
            }
            return Ok(ListFilter::RatingAtLeast(floor));
        }

        if let Some(name) = present(&self.name) {
            return Ok(ListFilter::Name(name.to_string()));
        }

        if let Some(raw) = present(&self.available) {
            let available = raw.parse::<bool>().map_err(|_| {
                ApiError::NotAcceptable("available must be true or false".to_string())
            })?;
            return Ok(ListFilter::Available(available));
        }

        Ok(ListFilter::None)
    }
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    b.unwrap_or(f64::MIN).total_cmp(&a.unwrap_or(f64::MIN))
}

/// `GET /products`
pub async fn list_products(
    State(db): State<Database>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Value>>, ApiError> {
    info!("Request for Product List");

    let filter = params.filter()?;
    let repo = db.products();

    let products = match filter {
        ListFilter::Category(category) => repo.find_by_category(&category).await?,
        ListFilter::PriceAtMost(ceiling) => {
            let mut products = repo.find_by_price(ceiling).await?;
            products.sort_by(|a, b| descending(a.price, b.price));
            products
        }
        ListFilter::RatingAtLeast(floor) => {
            let mut products: Vec<Product> = repo
                .find_by_rating(floor)
                .await?
                .into_iter()
                .filter(|p| p.rating.is_some())
                .collect();
            products.sort_by(|a, b| descending(a.rating, b.rating));
            products
        }
        ListFilter::Name(name) => repo.find_by_name(&name).await?,
        ListFilter::Available(true) => repo.find_by_availability().await?,
        ListFilter::Available(false) => repo
            .all()
            .await?
            .into_iter()
            .filter(|p| !p.available)
            .collect(),
        ListFilter::None => repo.all().await?,
    };

    info!(count = products.len(), "Returning products");
    Ok(products_json(&products))
}

// =============================================================================
// Lifecycle
// =============================================================================

/// `GET /products/{id}`
pub async fn get_product(
    State(db): State<Database>,
    ProductId(id): ProductId,
) -> Result<Json<Value>, ApiError> {
    info!(id, "Request for product");

    let product = db.products().find_or_404(id).await?;
    Ok(Json(product.to_json()))
}

/// `POST /products`
pub async fn create_product(
    State(db): State<Database>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    info!("Request to create a product");

    let data = json_body(&headers, &body)?;
    let product = Product::from_json(&data)?;
    let created = db.products().create(&product).await?;

    let id = created
        .id
        .ok_or_else(|| ApiError::Internal("created product has no id".to_string()))?;
    let location = format!("{}/products/{}", base_url(&headers), id);

    info!(id, "Product created");
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(created.to_json()),
    ))
}

/// `PUT /products/{id}`
///
/// Keys missing from the body keep their stored values. The `id` in the
/// body is ignored in favour of the path.
pub async fn update_product(
    State(db): State<Database>,
    ProductId(id): ProductId,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    info!(id, "Request to update product");
    require_json(&headers)?;

    let repo = db.products();
    let mut product = repo.find_or_404(id).await?;

    let data = parse_json(&body)?;
    product.apply_json(&data)?;
    product.id = Some(id);

    let updated = repo.update(&product).await?;
    info!(id, "Product updated");
    Ok(Json(updated.to_json()))
}

/// `DELETE /products/{id}` - 204 whether or not the product existed.
pub async fn delete_product(
    State(db): State<Database>,
    ProductId(id): ProductId,
) -> Result<StatusCode, ApiError> {
    info!(id, "Request to delete product");

    db.products().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Field Endpoints
// =============================================================================

/// Reads an integer 1..=5 from `{"rating": n}`.
fn rating_submission(data: &Value) -> Result<RatingSubmission, ApiError> {
    let value = match data.get("rating") {
        Some(Value::Number(n)) if !n.is_f64() => n.as_i64(),
        _ => {
            return Err(ApiError::NotAcceptable(
                "Rating should be of integer datatype".to_string(),
            ))
        }
    };

    value
        .and_then(|v| RatingSubmission::new(v).ok())
        .ok_or_else(|| ApiError::NotAcceptable("The ratings can be from [1,5]".to_string()))
}

/// Returns the value under `key`, rejecting a missing or null entry.
fn field<'a>(data: &'a Value, key: &str) -> Result<&'a Value, ApiError> {
    data.get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ApiError::NotAcceptable(format!("Body must contain '{}'", key)))
}

/// `PUT /products/{id}/rating`
pub async fn rate_product(
    State(db): State<Database>,
    ProductId(id): ProductId,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    info!(id, "Request to rate product");
    require_json(&headers)?;

    let repo = db.products();
    repo.find_or_404(id).await?;

    let submission = rating_submission(&parse_json(&body)?)?;
    let rated = repo.rate(id, submission).await?;

    info!(id, rating = ?rated.rating, "Product rated");
    Ok(Json(rated.to_json()))
}

/// `PUT /products/{id}/price`
pub async fn update_price(
    State(db): State<Database>,
    ProductId(id): ProductId,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    info!(id, "Request to update product price");
    require_json(&headers)?;

    let repo = db.products();
    repo.find_or_404(id).await?;

    let data = parse_json(&body)?;
    let price =
        check_price(field(&data, "price")?).map_err(|e| ApiError::NotAcceptable(e.to_string()))?;

    let updated = repo.update_price(id, price).await?;
    info!(id, price, "Product price updated");
    Ok(Json(updated.to_json()))
}

/// `PUT /products/{id}/description`
pub async fn update_description(
    State(db): State<Database>,
    ProductId(id): ProductId,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    info!(id, "Request to update product description");
    require_json(&headers)?;

    let repo = db.products();
    repo.find_or_404(id).await?;

    let data = parse_json(&body)?;
    let description = check_description(field(&data, "description")?)
        .map_err(|e| ApiError::NotAcceptable(e.to_string()))?;

    let updated = repo.update_description(id, &description).await?;
    info!(id, "Product description updated");
    Ok(Json(updated.to_json()))
}
