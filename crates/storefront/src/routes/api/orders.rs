//! Checkout API.

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::middleware::session::record_guest_order;
use crate::middleware::{OptionalAuth, cart_owner};
use crate::models::CartOwner;
use crate::services::checkout::{CheckoutError, CheckoutService};
use crate::state::AppState;

use super::ApiResult;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/orders/create", post(create))
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order_id: i32,
}

/// Turn the caller's cart into a completed order.
///
/// # Errors
///
/// Returns 400 `cart empty` when there is nothing to order.
#[instrument(skip(state, session))]
pub async fn create(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> ApiResult<CreateOrderResponse> {
    let owner = cart_owner(&session, user.as_ref(), false)
        .await?
        .ok_or(CheckoutError::CartEmpty)?;

    let order_id = CheckoutService::new(state.pool()).place_order(&owner).await?;

    if matches!(owner, CartOwner::Guest(_)) {
        record_guest_order(&session, order_id).await?;
    }

    add_breadcrumb(
        "checkout",
        "Placed order",
        Some(&[("order_id", &order_id.to_string())]),
    );

    Ok(Json(CreateOrderResponse {
        success: true,
        order_id: order_id.as_i32(),
    }))
}
