//! Order confirmation page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use mars_shop_core::OrderId;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::session::guest_orders;
use crate::middleware::{CspNonce, OptionalAuth, PageContext};
use crate::models::{CurrentUser, Order, OrderLine, order::items_count};
use crate::routes::params::PathId;
use crate::services::reviews::ReviewService;
use crate::state::AppState;

use super::views::ProductView;

/// Order success page template.
#[derive(Template, WebTemplate)]
#[template(path = "order_success.html")]
pub struct OrderSuccessTemplate {
    pub ctx: PageContext,
    pub order_id: i32,
    pub order_total: String,
    pub items_count: u32,
    /// Products the viewer has not reviewed yet.
    pub unreviewed: Vec<ProductView>,
    /// Only account holders can leave reviews.
    pub can_review: bool,
}

/// Whether the viewer placed this order, either with an account or as a guest
/// from this session.
fn is_viewer_order(order: &Order, user: Option<&CurrentUser>, guest_orders: &[OrderId]) -> bool {
    user.is_some_and(|u| order.is_owned_by(u.id))
        || (order.user_id.is_none() && guest_orders.contains(&order.id))
}

/// Distinct products of an order, in order of first appearance.
fn distinct_products(lines: &[OrderLine]) -> Vec<ProductView> {
    let mut products: Vec<ProductView> = Vec::with_capacity(lines.len());
    for line in lines {
        if !products.iter().any(|p| p.id == line.product.id.as_i32()) {
            products.push(ProductView::from(&line.product));
        }
    }
    products
}

/// Confirmation page shown after checkout.
///
/// Orders of other users and other sessions are reported as missing.
#[instrument(skip(state, session, nonce))]
pub async fn success(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let not_found = || AppError::NotFound(format!("order {id}"));

    let orders = OrderRepository::new(state.pool());
    let order = orders.get_by_id(OrderId::new(id)).await?.ok_or_else(not_found)?;

    let guest = guest_orders(&session).await?;
    if !is_viewer_order(&order, user.as_ref(), &guest) {
        return Err(not_found());
    }

    let lines = orders.items(order.id).await?;

    let (unreviewed, can_review) = match user.as_ref().filter(|u| order.is_owned_by(u.id)) {
        Some(owner) => {
            let statuses = ReviewService::new(state.pool())
                .status_for_order(owner.id, &lines)
                .await?;
            let unreviewed = statuses
                .iter()
                .filter(|status| !status.reviewed)
                .map(|status| ProductView::from(&status.product))
                .collect();
            (unreviewed, true)
        }
        None => (distinct_products(&lines), false),
    };

    Ok(OrderSuccessTemplate {
        ctx: PageContext::build(&state, Some(&session), user, nonce).await,
        order_id: order.id.as_i32(),
        order_total: order.total_price.to_string(),
        items_count: items_count(&lines),
        unreviewed,
        can_review,
    })
}
