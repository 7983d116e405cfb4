use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use catalog_db::Database;

use crate::error::ApiError;
use crate::extract::base_url;

pub const SERVICE_NAME: &str = "Product REST API Service";
pub const SERVICE_VERSION: &str = "1.0";

/// `GET /` - service metadata.
pub async fn index(headers: HeaderMap) -> Json<Value> {
    info!("Request for Root URL");
    Json(json!({
        "name": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "paths": format!("{}/products", base_url(&headers)),
    }))
}

/// `GET /health` - 200 while the database answers, 503 otherwise.
pub async fn health(State(db): State<Database>) -> Result<Json<Value>, ApiError> {
    if db.health_check().await {
        Ok(Json(json!({ "status": "ok" })))
    } else {
        Err(ApiError::Unavailable("database is not reachable".to_string()))
    }
}
