//! User domain types.

use chrono::{DateTime, Utc};

use mars_shop_core::{UserId, Username};

/// A registered shop user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Whether the user may see the statistics dashboard.
    pub is_staff: bool,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}
