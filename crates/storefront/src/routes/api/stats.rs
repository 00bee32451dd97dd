//! Sales statistics API for the dashboard charts (staff only).

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use crate::middleware::RequireStaff;
use crate::services::stats::{ChartSeries, StatsService, parse_days};
use crate::state::AppState;

use super::ApiResult;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stats/sales", get(sales))
        .route("/api/stats/categories", get(categories))
}

/// `?days=N`; kept as text so junk falls back to the default window.
#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub days: Option<String>,
}

/// Completed revenue per day.
///
/// # Errors
///
/// Returns `ApiError` if the query fails.
#[instrument(skip_all)]
pub async fn sales(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Query(params): Query<StatsParams>,
) -> ApiResult<ChartSeries> {
    let days = parse_days(params.days.as_deref());
    Ok(Json(StatsService::new(state.pool()).sales(days).await?))
}

/// Completed revenue per category.
///
/// # Errors
///
/// Returns `ApiError` if the query fails.
#[instrument(skip_all)]
pub async fn categories(
    State(state): State<AppState>,
    _staff: RequireStaff,
    Query(params): Query<StatsParams>,
) -> ApiResult<ChartSeries> {
    let days = parse_days(params.days.as_deref());
    Ok(Json(StatsService::new(state.pool()).categories(days).await?))
}
