//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Checkout creates orders directly in the `Completed` state; only completed
/// orders count as purchases for reviews and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is being processed.
    Pending,
    /// Order has been paid and counts as a purchase.
    #[default]
    Completed,
    /// Order was cancelled.
    Cancelled,
}

impl OrderStatus {
    /// Human-readable label for templates.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Processing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_completed() {
        assert_eq!(OrderStatus::default(), OrderStatus::Completed);
    }

    #[test]
    fn test_display_from_str_agree() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_rejects_unknown_status() {
        assert!("shipped".parse::<OrderStatus>().is_err());
    }
}
