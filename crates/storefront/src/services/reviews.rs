//! Review eligibility and submission.
//!
//! Only users with a completed purchase of a product may review it, and each
//! user keeps at most one review per product.

use sqlx::PgPool;
use thiserror::Error;

use mars_shop_core::{ProductId, Rating, UserId};

use crate::db::reviews::UpsertedReview;
use crate::db::{OrderRepository, RepositoryError, ReviewRepository};
use crate::models::{OrderLine, Product, Review};

#[derive(Debug, Error)]
pub enum ReviewError {
    /// The user has no completed order containing the product.
    #[error("product not purchased")]
    NotPurchased,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Review state of one product in an order.
#[derive(Debug, Clone)]
pub struct ReviewStatus {
    pub product: Product,
    pub reviewed: bool,
}

pub struct ReviewService<'a> {
    reviews: ReviewRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            reviews: ReviewRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// Whether the review form should be offered: purchased and not yet reviewed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn can_review(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        if !self.orders.has_completed_purchase(user_id, product_id).await? {
            return Ok(false);
        }
        Ok(!self.reviews.exists(user_id, product_id).await?)
    }

    /// Whether the user may submit (or update) a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn has_purchased(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        self.orders.has_completed_purchase(user_id, product_id).await
    }

    /// Create the user's review, or update the existing one.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotPurchased` without a completed purchase.
    pub async fn submit(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: Rating,
        text: &str,
    ) -> Result<UpsertedReview, ReviewError> {
        if !self.has_purchased(user_id, product_id).await? {
            return Err(ReviewError::NotPurchased);
        }

        let result = self
            .reviews
            .upsert(user_id, product_id, rating, text.trim())
            .await?;

        tracing::info!(
            %user_id,
            %product_id,
            rating = rating.value(),
            created = result.created,
            "Review saved"
        );

        Ok(result)
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        self.reviews.list_for_product(product_id).await
    }

    /// Review state for each distinct product in an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn status_for_order(
        &self,
        user_id: UserId,
        lines: &[OrderLine],
    ) -> Result<Vec<ReviewStatus>, RepositoryError> {
        let mut products: Vec<Product> = Vec::with_capacity(lines.len());
        for line in lines {
            if !products.iter().any(|p| p.id == line.product.id) {
                products.push(line.product.clone());
            }
        }

        let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let reviewed = self.reviews.reviewed_products(user_id, &ids).await?;

        Ok(products
            .into_iter()
            .map(|product| ReviewStatus {
                reviewed: reviewed.contains(&product.id),
                product,
            })
            .collect())
    }
}

/// Mean rating rounded to one decimal, `None` without reviews.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }

    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating.value())).sum();
    let mean = f64::from(sum) / f64::from(u32::try_from(reviews.len()).unwrap_or(u32::MAX));
    Some((mean * 10.0).round() / 10.0)
}

/// Parse the rating form field; missing or non-numeric input uses the default.
#[must_use]
pub fn parse_rating(raw: Option<&str>) -> Rating {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map_or(Rating::DEFAULT, Rating::clamped)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use mars_shop_core::{ReviewId, Username};

    use super::*;

    fn review(rating: i64) -> Review {
        Review {
            id: ReviewId::new(1),
            product_id: ProductId::new(1),
            user_id: UserId::new(1),
            username: Username::parse("marvin").unwrap(),
            rating: Rating::clamped(rating),
            text: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_average_rating_none_without_reviews() {
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn test_average_rating_rounds_to_one_decimal() {
        let reviews = vec![review(5), review(4), review(4)];
        assert_eq!(average_rating(&reviews), Some(4.3));
        assert_eq!(average_rating(&[review(2)]), Some(2.0));
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating(None), Rating::DEFAULT);
        assert_eq!(parse_rating(Some("abc")), Rating::DEFAULT);
        assert_eq!(parse_rating(Some(" 3 ")).value(), 3);
        assert_eq!(parse_rating(Some("0")).value(), 1);
        assert_eq!(parse_rating(Some("42")).value(), 5);
    }
}
