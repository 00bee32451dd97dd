//! Product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::IntoResponse,
};
use tracing::instrument;

use mars_shop_core::ProductId;

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::PageContext;
use crate::routes::params::PathId;
use crate::services::reviews::{ReviewService, average_rating};
use crate::state::AppState;

use super::views::{ProductView, ReviewView};

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "product_detail.html")]
pub struct ProductDetailTemplate {
    pub ctx: PageContext,
    pub product: ProductView,
    pub reviews: Vec<ReviewView>,
    /// Mean rating with one decimal, `None` without reviews.
    pub avg_rating: Option<String>,
    pub can_review: bool,
}

/// Display a product with its reviews.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    PathId(id): PathId,
) -> Result<impl IntoResponse, AppError> {
    let product_id = ProductId::new(id);
    let product = ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let service = ReviewService::new(state.pool());
    let reviews = service.for_product(product_id).await?;

    let can_review = match &ctx.user {
        Some(user) => service.can_review(user.id, product_id).await?,
        None => false,
    };

    Ok(ProductDetailTemplate {
        avg_rating: average_rating(&reviews).map(|avg| format!("{avg:.1}")),
        reviews: reviews.iter().map(ReviewView::from).collect(),
        product: ProductView::from(&product),
        can_review,
        ctx,
    })
}
