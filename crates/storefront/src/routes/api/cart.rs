//! Cart API: read, add, change quantity, clear.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use mars_shop_core::{CartItemId, ProductId};

use crate::db::RepositoryError;
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{OptionalAuth, cart_owner};
use crate::models::{Cart, CartLine};
use crate::services::cart::{CartService, QuantityAction, QuantityUpdate};
use crate::state::AppState;

use super::products::ProductJson;
use super::{ApiError, ApiResult, Success};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(show))
        .route("/api/cart/add", post(add))
        .route("/api/cart/update_qty", post(update_qty))
        .route("/api/cart/clear", post(clear))
}

/// Cart line as exposed by the API.
#[derive(Debug, Serialize)]
pub struct CartItemJson {
    pub id: i32,
    pub product: ProductJson,
    pub quantity: u32,
    pub total_price: f64,
}

impl From<&CartLine> for CartItemJson {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.as_i32(),
            product: ProductJson::from(&line.product),
            quantity: line.quantity,
            total_price: line.total_price().to_f64(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartJson {
    pub items: Vec<CartItemJson>,
    pub cart_total: f64,
}

impl From<&Cart> for CartJson {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines.iter().map(CartItemJson::from).collect(),
            cart_total: cart.total().to_f64(),
        }
    }
}

const fn default_qty() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: i32,
    #[serde(default = "default_qty")]
    pub qty: i64,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub success: bool,
    pub cart_total: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQtyRequest {
    pub item_id: i32,
    #[serde(default)]
    pub action: String,
}

/// Either the new line state or `deleted: true`.
#[derive(Debug, Default, Serialize)]
pub struct UpdateQtyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_qty: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl From<QuantityUpdate> for UpdateQtyResponse {
    fn from(update: QuantityUpdate) -> Self {
        match update {
            QuantityUpdate::Updated {
                new_qty,
                item_total,
                cart_total,
            } => Self {
                success: true,
                new_qty: Some(new_qty),
                item_total: Some(item_total.to_f64()),
                cart_total: Some(cart_total.to_f64()),
                deleted: None,
            },
            QuantityUpdate::Deleted => Self {
                success: true,
                deleted: Some(true),
                ..Self::default()
            },
        }
    }
}

/// Validate the requested quantity.
fn parse_qty(qty: i64) -> Result<u32, AppError> {
    if qty < 1 {
        return Err(AppError::BadRequest("qty must be at least 1".to_string()));
    }
    u32::try_from(qty).map_err(|_| AppError::BadRequest("qty too large".to_string()))
}

/// Current cart contents.
///
/// # Errors
///
/// Returns `ApiError` if the session or database fails.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> ApiResult<CartJson> {
    let cart = match cart_owner(&session, user.as_ref(), false).await? {
        Some(owner) => CartService::new(state.pool(), owner).contents().await?,
        None => Cart::default(),
    };
    Ok(Json(CartJson::from(&cart)))
}

/// Add a product; an existing line grows by `qty`.
///
/// # Errors
///
/// Returns 400 for a bad body or quantity and 404 for an unknown product.
#[instrument(skip(state, session, body))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    body: Result<Json<AddRequest>, JsonRejection>,
) -> ApiResult<AddResponse> {
    let Json(request) = body?;
    let quantity = parse_qty(request.qty)?;

    let owner = cart_owner(&session, user.as_ref(), true)
        .await?
        .ok_or_else(|| AppError::Internal("no cart owner".to_string()))?;

    let cart_total = CartService::new(state.pool(), owner)
        .add(ProductId::new(request.product_id), quantity)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                ApiError(AppError::NotFound(format!("product {}", request.product_id)))
            }
            other => ApiError::from(other),
        })?;

    add_breadcrumb(
        "cart",
        "Added product",
        Some(&[("product_id", &request.product_id.to_string())]),
    );

    Ok(Json(AddResponse {
        success: true,
        cart_total: cart_total.to_f64(),
    }))
}

/// Increase or decrease one line; decreasing a single unit deletes it.
///
/// # Errors
///
/// Returns 404 if the line is not in the caller's cart.
#[instrument(skip(state, session, body))]
pub async fn update_qty(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    body: Result<Json<UpdateQtyRequest>, JsonRejection>,
) -> ApiResult<UpdateQtyResponse> {
    let Json(request) = body?;
    let item_not_found = || ApiError(AppError::NotFound(format!("cart item {}", request.item_id)));

    let owner = cart_owner(&session, user.as_ref(), false)
        .await?
        .ok_or_else(item_not_found)?;

    let update = CartService::new(state.pool(), owner)
        .update_quantity(
            CartItemId::new(request.item_id),
            QuantityAction::parse(&request.action),
        )
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => item_not_found(),
            other => ApiError::from(other),
        })?;

    Ok(Json(UpdateQtyResponse::from(update)))
}

/// Remove every line from the cart.
///
/// # Errors
///
/// Returns `ApiError` if the session or database fails.
#[instrument(skip(state, session))]
pub async fn clear(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> ApiResult<Success> {
    if let Some(owner) = cart_owner(&session, user.as_ref(), false).await? {
        CartService::new(state.pool(), owner).clear().await?;
    }
    Ok(Json(Success::OK))
}
