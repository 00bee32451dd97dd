//! Review form and per-order review overview.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mars_shop_core::{OrderId, ProductId, Rating};

use crate::db::{OrderRepository, ProductRepository};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, PageContext, push_flash};
use crate::models::{FlashMessage, Product, order::items_count};
use crate::routes::params::PathId;
use crate::services::reviews::{ReviewError, ReviewService, parse_rating};
use crate::state::AppState;

use super::views::{ProductView, ReviewStatusView};

const MSG_LOGIN_FIRST: &str = "Please log in first.";
const MSG_PURCHASE_FIRST: &str = "You can only review a product after purchasing it.";

/// Review form data. Rating stays text so bad input falls back to the default.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// Add review page template.
#[derive(Template, WebTemplate)]
#[template(path = "add_review.html")]
pub struct AddReviewTemplate {
    pub ctx: PageContext,
    pub product: ProductView,
    pub ratings: Vec<u8>,
    pub selected_rating: u8,
}

/// Order review overview template.
#[derive(Template, WebTemplate)]
#[template(path = "order_reviews.html")]
pub struct OrderReviewsTemplate {
    pub ctx: PageContext,
    pub order_id: i32,
    pub order_date: String,
    pub items_count: u32,
    pub products: Vec<ReviewStatusView>,
}

async fn load_product(state: &AppState, id: i32) -> Result<Product, AppError> {
    ProductRepository::new(state.pool())
        .get_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Display the review form for a purchased product.
#[instrument(skip(state, session, nonce))]
pub async fn add_review_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
    PathId(id): PathId,
) -> Result<Response, AppError> {
    let product = load_product(&state, id).await?;

    let Some(user) = user else {
        push_flash(&session, FlashMessage::error(MSG_LOGIN_FIRST)).await;
        return Ok(Redirect::to("/login").into_response());
    };

    if !ReviewService::new(state.pool())
        .has_purchased(user.id, product.id)
        .await?
    {
        push_flash(&session, FlashMessage::error(MSG_PURCHASE_FIRST)).await;
        return Ok(Redirect::to(&format!("/product/{id}")).into_response());
    }

    Ok(AddReviewTemplate {
        ctx: PageContext::build(&state, Some(&session), Some(user), nonce).await,
        product: ProductView::from(&product),
        ratings: (Rating::MIN..=Rating::MAX).rev().collect(),
        selected_rating: Rating::DEFAULT.value(),
    }
    .into_response())
}

/// Save a review; resubmitting updates the existing review.
#[instrument(skip(state, session, form))]
pub async fn add_review(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    PathId(id): PathId,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let product = load_product(&state, id).await?;

    let Some(user) = user else {
        push_flash(&session, FlashMessage::error(MSG_LOGIN_FIRST)).await;
        return Ok(Redirect::to("/login").into_response());
    };

    let rating = parse_rating(form.rating.as_deref());
    match ReviewService::new(state.pool())
        .submit(user.id, product.id, rating, &form.text)
        .await
    {
        Ok(_) => {
            add_breadcrumb("review", "Submitted review", Some(&[("product_id", &id.to_string())]));
            push_flash(&session, FlashMessage::success("Thank you for your review!")).await;
        }
        Err(ReviewError::NotPurchased) => {
            push_flash(&session, FlashMessage::error(MSG_PURCHASE_FIRST)).await;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to(&format!("/product/{id}")).into_response())
}

/// Review status of every product in one of the user's orders.
#[instrument(skip(state, session, nonce))]
pub async fn order_reviews(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
    PathId(order_id): PathId,
) -> Result<Response, AppError> {
    let Some(user) = user else {
        push_flash(&session, FlashMessage::error(MSG_LOGIN_FIRST)).await;
        return Ok(Redirect::to("/login").into_response());
    };

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get_by_id(OrderId::new(order_id))
        .await?
        .filter(|order| order.is_owned_by(user.id))
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    let lines = orders.items(order.id).await?;
    let statuses = ReviewService::new(state.pool())
        .status_for_order(user.id, &lines)
        .await?;

    let products = statuses
        .iter()
        .map(|status| {
            let quantity = lines
                .iter()
                .filter(|line| line.product.id == status.product.id)
                .map(|line| line.quantity)
                .sum();
            ReviewStatusView::new(status, quantity)
        })
        .collect();

    Ok(OrderReviewsTemplate {
        ctx: PageContext::build(&state, Some(&session), Some(user), nonce).await,
        order_id,
        order_date: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        items_count: items_count(&lines),
        products,
    }
    .into_response())
}
