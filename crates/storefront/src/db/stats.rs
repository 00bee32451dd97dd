//! Aggregate queries for the sales dashboard.
//!
//! Only completed orders count as sales.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use mars_shop_core::{OrderStatus, Price};

use super::RepositoryError;

/// Headline numbers shown above the dashboard charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardTotals {
    pub completed_orders: i64,
    pub revenue: Price,
    pub users: i64,
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    completed_orders: i64,
    revenue: Price,
    users: i64,
}

/// Revenue for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DailySales {
    pub day: NaiveDate,
    pub revenue: Price,
}

/// Revenue attributed to one category.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CategorySales {
    pub category: String,
    pub revenue: Price,
}

/// Repository for statistics queries.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Completed order count, completed revenue and user count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self) -> Result<DashboardTotals, RepositoryError> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM shop.order WHERE status = $1) AS completed_orders,
                (SELECT COALESCE(SUM(total_price), 0) FROM shop.order WHERE status = $1) AS revenue,
                (SELECT COUNT(*) FROM shop.user) AS users
            ",
        )
        .bind(OrderStatus::Completed)
        .fetch_one(self.pool)
        .await?;

        Ok(DashboardTotals {
            completed_orders: row.completed_orders,
            revenue: row.revenue,
            users: row.users,
        })
    }

    /// Completed revenue per UTC calendar day since `since`, oldest first.
    ///
    /// Days without sales are omitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_by_day(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailySales>, RepositoryError> {
        let rows = sqlx::query_as::<_, DailySales>(
            r"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day,
                   SUM(total_price) AS revenue
            FROM shop.order
            WHERE status = $1 AND created_at >= $2
            GROUP BY day
            ORDER BY day
            ",
        )
        .bind(OrderStatus::Completed)
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Completed revenue per category since `since`, largest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revenue_by_category(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<CategorySales>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategorySales>(
            r"
            SELECT c.name AS category,
                   SUM(oi.quantity * oi.unit_price) AS revenue
            FROM shop.order_item oi
            JOIN shop.order o ON o.id = oi.order_id
            JOIN shop.product p ON p.id = oi.product_id
            JOIN shop.category c ON c.id = p.category_id
            WHERE o.status = $1 AND o.created_at >= $2
            GROUP BY c.name
            ORDER BY revenue DESC, c.name
            ",
        )
        .bind(OrderStatus::Completed)
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
