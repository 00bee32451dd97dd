//! Sales statistics for the staff dashboard.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::db::stats::DashboardTotals;
use crate::db::{RepositoryError, StatsRepository};

/// Window used when `days` is missing or invalid.
pub const DEFAULT_DAYS: u32 = 30;

/// Longest window accepted from the query string (about a century).
pub const MAX_DAYS: u32 = 36_500;

/// Chart data: parallel label and value arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Parse the `days` query parameter, clamped to [`MAX_DAYS`].
#[must_use]
pub fn parse_days(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .map_or(DEFAULT_DAYS, |days| days.min(MAX_DAYS))
}

/// Start of a window covering the last `days` days.
///
/// Saturates at the earliest representable instant instead of overflowing.
#[must_use]
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub struct StatsService<'a> {
    stats: StatsRepository<'a>,
}

impl<'a> StatsService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            stats: StatsRepository::new(pool),
        }
    }

    /// Headline totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn totals(&self) -> Result<DashboardTotals, RepositoryError> {
        self.stats.totals().await
    }

    /// Revenue per day over the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn sales(&self, days: u32) -> Result<ChartSeries, RepositoryError> {
        let rows = self
            .stats
            .sales_by_day(window_start(Utc::now(), days))
            .await?;

        Ok(ChartSeries {
            labels: rows.iter().map(|r| r.day.format("%Y-%m-%d").to_string()).collect(),
            values: rows.iter().map(|r| r.revenue.to_f64()).collect(),
        })
    }

    /// Revenue per category over the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn categories(&self, days: u32) -> Result<ChartSeries, RepositoryError> {
        let rows = self
            .stats
            .revenue_by_category(window_start(Utc::now(), days))
            .await?;

        Ok(ChartSeries {
            labels: rows.iter().map(|r| r.category.clone()).collect(),
            values: rows.iter().map(|r| r.revenue.to_f64()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days(None), 30);
        assert_eq!(parse_days(Some("7")), 7);
        assert_eq!(parse_days(Some("0")), 0);
        assert_eq!(parse_days(Some("-3")), 30);
        assert_eq!(parse_days(Some("week")), 30);
    }

    #[test]
    fn test_parse_days_clamps_huge_windows() {
        assert_eq!(parse_days(Some("36500")), MAX_DAYS);
        assert_eq!(parse_days(Some("4294967295")), MAX_DAYS);

        let now = Utc::now();
        assert!(window_start(now, parse_days(Some("4294967295"))) < now);
    }

    #[test]
    fn test_window_start_saturates() {
        assert_eq!(window_start(Utc::now(), u32::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_window_start() {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 31, 12, 0, 0)
            .single()
            .unwrap_or_default();
        let start = window_start(now, 30);
        assert_eq!(start.format("%Y-%m-%d %H:%M").to_string(), "2026-03-01 12:00");
        assert_eq!(window_start(now, 0), now);
    }

    #[test]
    fn test_series_serializes_as_parallel_arrays() {
        let series = ChartSeries {
            labels: vec!["Rovers".to_string()],
            values: vec![12.5],
        };
        let json = serde_json::to_value(&series).unwrap_or_default();
        assert_eq!(json, serde_json::json!({"labels": ["Rovers"], "values": [12.5]}));
    }
}
