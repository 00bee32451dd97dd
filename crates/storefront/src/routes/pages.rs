//! Welcome and catalog pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, PageContext};
use crate::services::catalog::{self, CatalogParams, CatalogQuery};
use crate::state::AppState;

use super::views::{CategoryOption, ProductView};

/// Landing page for anonymous visitors.
#[derive(Template, WebTemplate)]
#[template(path = "welcome.html")]
pub struct WelcomeTemplate {
    pub ctx: PageContext,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryOption>,
    pub search_query: String,
    pub min_price: String,
    pub max_price: String,
    pub current_sort: String,
    pub active_category: Option<i32>,
    pub page_number: i64,
    pub num_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: i64,
    pub next_page: i64,
    pub total: i64,
}

/// Display the welcome page; signed-in users go straight to the catalog.
pub async fn welcome(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    WelcomeTemplate {
        ctx: PageContext::build(&state, Some(&session), None, nonce).await,
    }
    .into_response()
}

/// Display the catalog with search, price, category and sort filters.
#[instrument(skip(state, session, nonce, params))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    CspNonce(nonce): CspNonce,
    Query(params): Query<CatalogParams>,
) -> Result<Response, AppError> {
    if user.is_none() {
        return Ok(Redirect::to("/welcome").into_response());
    }

    let query = CatalogQuery::parse(&params);
    let page = catalog::browse(state.pool(), &query).await?;
    let active_category = query.filter.category.map(|id| id.as_i32());

    Ok(IndexTemplate {
        ctx: PageContext::build(&state, Some(&session), user, nonce).await,
        products: page.products.iter().map(ProductView::from).collect(),
        categories: CategoryOption::list(&page.categories, active_category),
        search_query: query.filter.search.clone().unwrap_or_default(),
        min_price: params.min_price.unwrap_or_default(),
        max_price: params.max_price.unwrap_or_default(),
        current_sort: query.sort.as_str().to_owned(),
        active_category,
        page_number: page.page.number,
        num_pages: page.page.num_pages,
        has_previous: page.page.has_previous(),
        has_next: page.page.has_next(),
        previous_page: page.page.previous(),
        next_page: page.page.next(),
        total: page.page.total,
    }
    .into_response())
}
