//! Cart page.
//!
//! The page is rendered server-side; quantity changes, clearing and checkout
//! go through the JSON API from `shop.js`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, PageContext, cart_owner};
use crate::models::Cart;
use crate::services::cart::CartService;
use crate::state::AppState;

use super::views::CartLineView;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub ctx: PageContext,
    pub items: Vec<CartLineView>,
    pub cart_total: String,
}

/// Display the cart of the current user or guest session.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let cart = match cart_owner(&session, user.as_ref(), false).await? {
        Some(owner) => CartService::new(state.pool(), owner).contents().await?,
        None => Cart::default(),
    };

    Ok(CartTemplate {
        ctx: PageContext::build(&state, Some(&session), user, nonce).await,
        items: cart.lines.iter().map(CartLineView::from).collect(),
        cart_total: cart.total().to_string(),
    })
}
