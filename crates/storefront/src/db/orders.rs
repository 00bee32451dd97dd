//! Order repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mars_shop_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::{RepositoryError, out_of_range, quantity_from_db};
use crate::models::{CartOwner, Order, OrderLine, Product};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: Option<i32>,
    total_price: Price,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    order_item_id: i32,
    quantity: i32,
    unit_price: Price,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.order_item_id),
            quantity: quantity_from_db(row.quantity)?,
            unit_price: row.unit_price,
            product: Product::from(row.product),
        })
    }
}

#[derive(sqlx::FromRow)]
struct CheckoutLineRow {
    product_id: i32,
    quantity: i32,
    price: Price,
}

/// Repository for orders and their items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn a cart into a completed order.
    ///
    /// Runs in one transaction: the cart rows are locked and read, the order
    /// and its items are inserted with the current product prices, and the
    /// cart is emptied. Returns `None` when the cart is empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::OutOfRange` if the total does not fit the
    /// order's price column, and `RepositoryError::Database` if any other
    /// statement fails. Nothing is changed in either case.
    pub async fn create_from_cart(
        &self,
        owner: &CartOwner,
    ) -> Result<Option<OrderId>, RepositoryError> {
        let user_id = owner.user_id().map(|id| id.as_i32());
        let session_key = owner.session_key();

        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CheckoutLineRow>(
            r"
            SELECT ci.product_id, ci.quantity, p.price
            FROM shop.cart_item ci
            JOIN shop.product p ON p.id = ci.product_id
            WHERE ($1::int IS NOT NULL AND ci.user_id = $1)
               OR ($1::int IS NULL AND ci.user_id IS NULL AND ci.session_key = $2)
            ORDER BY ci.added_at, ci.id
            FOR UPDATE OF ci
            ",
        )
        .bind(user_id)
        .bind(session_key)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            tx.rollback().await?;
            return Ok(None);
        }

        let mut total = Price::ZERO;
        for line in &lines {
            total = total + line.price.times(quantity_from_db(line.quantity)?);
        }

        let order_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.order (user_id, total_price, status)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(total)
        .bind(OrderStatus::Completed)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| out_of_range(e, "order total"))?;

        for line in &lines {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"
            DELETE FROM shop.cart_item ci
            WHERE ($1::int IS NOT NULL AND ci.user_id = $1)
               OR ($1::int IS NULL AND ci.user_id IS NULL AND ci.session_key = $2)
            ",
        )
        .bind(user_id)
        .bind(session_key)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id, lines = lines.len(), total = %total, "Order placed");

        Ok(Some(OrderId::new(order_id)))
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total_price, status, created_at
            FROM shop.order
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Lines of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let sql = format!(
            "SELECT oi.id AS order_item_id, oi.quantity, oi.unit_price, {PRODUCT_COLUMNS} \
             FROM shop.order_item oi \
             JOIN shop.product p ON p.id = oi.product_id \
             JOIN shop.category c ON c.id = p.category_id \
             WHERE oi.order_id = $1 \
             ORDER BY oi.id"
        );

        let rows = sqlx::query_as::<_, OrderLineRow>(&sql)
            .bind(id)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(OrderLine::try_from).collect()
    }

    /// Whether the user has a completed order containing the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_completed_purchase(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let purchased: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM shop.order_item oi
                JOIN shop.order o ON o.id = oi.order_id
                WHERE o.user_id = $1
                  AND oi.product_id = $2
                  AND o.status = $3
            )
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(OrderStatus::Completed)
        .fetch_one(self.pool)
        .await?;

        Ok(purchased)
    }
}
