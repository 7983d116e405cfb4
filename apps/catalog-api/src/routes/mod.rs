use axum::{routing::get, Router};

use catalog_db::Database;

pub mod index;
pub mod products;

/// Router for every endpoint, still waiting for its `Database` state.
pub fn router() -> Router<Database> {
    Router::new()
        .route("/", get(index::index))
        .route("/health", get(index::health))
        .merge(products::router())
}
