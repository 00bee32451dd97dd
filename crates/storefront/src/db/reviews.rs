//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mars_shop_core::{ProductId, Rating, ReviewId, UserId, Username};

use super::RepositoryError;
use crate::models::Review;

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    user_id: i32,
    username: String,
    rating: i32,
    text: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: UserId::new(row.user_id),
            username,
            rating: Rating::clamped(i64::from(row.rating)),
            text: row.text,
            created_at: row.created_at,
        })
    }
}

/// Result of [`ReviewRepository::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertedReview {
    pub id: ReviewId,
    /// `false` when an existing review was updated.
    pub created: bool,
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    id: i32,
    created: bool,
}

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.text, r.created_at
            FROM shop.review r
            JOIN shop.user u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    /// Whether the user already reviewed the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM shop.review WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Products among `product_ids` the user has reviewed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reviewed_products(
        &self,
        user_id: UserId,
        product_ids: &[ProductId],
    ) -> Result<Vec<ProductId>, RepositoryError> {
        let ids: Vec<i32> = product_ids.iter().map(ProductId::as_i32).collect();

        let reviewed: Vec<i32> = sqlx::query_scalar(
            "SELECT product_id FROM shop.review WHERE user_id = $1 AND product_id = ANY($2)",
        )
        .bind(user_id)
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(reviewed.into_iter().map(ProductId::new).collect())
    }

    /// Insert a review, or update the rating and text of the existing one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: Rating,
        text: &str,
    ) -> Result<UpsertedReview, RepositoryError> {
        // xmax is zero only for freshly inserted tuples.
        let row = sqlx::query_as::<_, UpsertRow>(
            r"
            INSERT INTO shop.review (product_id, user_id, rating, text)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id, user_id)
            DO UPDATE SET rating = EXCLUDED.rating, text = EXCLUDED.text
            RETURNING id, (xmax = 0) AS created
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating.as_i32())
        .bind(text)
        .fetch_one(self.pool)
        .await?;

        Ok(UpsertedReview {
            id: ReviewId::new(row.id),
            created: row.created,
        })
    }
}
