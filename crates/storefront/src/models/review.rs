//! Review domain types.

use chrono::{DateTime, Utc};

use mars_shop_core::{ProductId, Rating, ReviewId, UserId, Username};

/// A user's review of a product they purchased.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Author's username, joined for display.
    pub username: Username,
    pub rating: Rating,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
