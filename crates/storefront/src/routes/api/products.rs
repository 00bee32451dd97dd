//! Product list API.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::models::Product;
use crate::state::AppState;

use super::ApiResult;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/products", get(list))
}

/// Product as exposed by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ProductJson {
    pub id: i32,
    pub name: String,
    /// Decimal string with two places.
    pub price: String,
    pub description: String,
    /// Empty string when the product has no photo.
    pub photo_url: String,
}

impl From<&Product> for ProductJson {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            price: product.price.to_string(),
            description: product.description.clone(),
            photo_url: product.photo_url(),
        }
    }
}

/// List every product, newest first.
///
/// # Errors
///
/// Returns `ApiError` if the query fails.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ProductJson>> {
    let products = ProductRepository::new(state.pool()).list_all().await?;
    Ok(Json(products.iter().map(ProductJson::from).collect()))
}
