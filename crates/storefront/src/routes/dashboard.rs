//! Staff sales dashboard.
//!
//! The headline numbers render server-side; the charts are drawn by
//! `dashboard.js` from the stats API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::services::stats::{DEFAULT_DAYS, StatsService};
use crate::state::AppState;

/// Range buttons offered above the charts.
const RANGES: &[u32] = &[7, 30, 90, 365];

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin_dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub total_orders: i64,
    pub total_revenue: String,
    pub total_users: i64,
    pub ranges: &'static [u32],
    pub default_days: u32,
}

/// Display the dashboard.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    ctx: PageContext,
) -> Result<impl IntoResponse, AppError> {
    let totals = StatsService::new(state.pool()).totals().await?;

    Ok(DashboardTemplate {
        ctx,
        total_orders: totals.completed_orders,
        total_revenue: totals.revenue.to_string(),
        total_users: totals.users,
        ranges: RANGES,
        default_days: DEFAULT_DAYS,
    })
}
