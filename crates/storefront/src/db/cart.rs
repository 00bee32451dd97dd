//! Cart repository.
//!
//! Every query is scoped to a [`CartOwner`]: user carts match on `user_id`,
//! guest carts match on `session_key` with no user.

use sqlx::PgPool;

use mars_shop_core::{CartItemId, ProductId, UserId};

use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::{RepositoryError, out_of_range, quantity_from_db, quantity_to_db};
use crate::models::{CartLine, CartOwner, Product};

/// Predicate matching the rows of one owner, with `$1` = user id and
/// `$2` = session key.
const OWNER_PREDICATE: &str = "(($1::int IS NOT NULL AND ci.user_id = $1) \
     OR ($1::int IS NULL AND ci.user_id IS NULL AND ci.session_key = $2))";

#[derive(sqlx::FromRow)]
struct CartLineRow {
    cart_item_id: i32,
    quantity: i32,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CartItemId::new(row.cart_item_id),
            quantity: quantity_from_db(row.quantity)?,
            product: Product::from(row.product),
        })
    }
}

fn owner_binds(owner: &CartOwner) -> (Option<i32>, Option<&str>) {
    (owner.user_id().map(|id| id.as_i32()), owner.session_key())
}

/// Repository for cart rows.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lines of a cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, owner: &CartOwner) -> Result<Vec<CartLine>, RepositoryError> {
        let (user_id, session_key) = owner_binds(owner);
        let sql = format!(
            "SELECT ci.id AS cart_item_id, ci.quantity, {PRODUCT_COLUMNS} \
             FROM shop.cart_item ci \
             JOIN shop.product p ON p.id = ci.product_id \
             JOIN shop.category c ON c.id = p.category_id \
             WHERE {OWNER_PREDICATE} \
             ORDER BY ci.added_at, ci.id"
        );

        let rows = sqlx::query_as::<_, CartLineRow>(&sql)
            .bind(user_id)
            .bind(session_key)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(CartLine::try_from).collect()
    }

    /// One line of a cart. Lines of other owners are not visible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_line(
        &self,
        owner: &CartOwner,
        item_id: CartItemId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let (user_id, session_key) = owner_binds(owner);
        let sql = format!(
            "SELECT ci.id AS cart_item_id, ci.quantity, {PRODUCT_COLUMNS} \
             FROM shop.cart_item ci \
             JOIN shop.product p ON p.id = ci.product_id \
             JOIN shop.category c ON c.id = p.category_id \
             WHERE {OWNER_PREDICATE} AND ci.id = $3"
        );

        let row = sqlx::query_as::<_, CartLineRow>(&sql)
            .bind(user_id)
            .bind(session_key)
            .bind(item_id)
            .fetch_optional(self.pool)
            .await?;

        row.map(CartLine::try_from).transpose()
    }

    /// Sum of quantities in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, owner: &CartOwner) -> Result<i64, RepositoryError> {
        let (user_id, session_key) = owner_binds(owner);
        let sql = format!(
            "SELECT COALESCE(SUM(ci.quantity), 0)::bigint FROM shop.cart_item ci \
             WHERE {OWNER_PREDICATE}"
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(session_key)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Add `quantity` of a product, incrementing an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::OutOfRange` if the line quantity would overflow.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let quantity = quantity_to_db(quantity)?;

        let query = match owner {
            CartOwner::User(user_id) => sqlx::query(
                r"
                INSERT INTO shop.cart_item (user_id, product_id, quantity)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, product_id) WHERE user_id IS NOT NULL
                DO UPDATE SET quantity = shop.cart_item.quantity + EXCLUDED.quantity
                ",
            )
            .bind(*user_id),
            CartOwner::Guest(session_key) => sqlx::query(
                r"
                INSERT INTO shop.cart_item (session_key, product_id, quantity)
                VALUES ($1, $2, $3)
                ON CONFLICT (session_key, product_id) WHERE user_id IS NULL
                DO UPDATE SET quantity = shop.cart_item.quantity + EXCLUDED.quantity
                ",
            )
            .bind(session_key.as_str()),
        };

        query
            .bind(product_id)
            .bind(quantity)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::NotFound;
                }
                out_of_range(e, "cart quantity")
            })?;

        Ok(())
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't belong to `owner`.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_quantity(
        &self,
        owner: &CartOwner,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let (user_id, session_key) = owner_binds(owner);
        let sql = format!(
            "UPDATE shop.cart_item ci SET quantity = $4 \
             WHERE {OWNER_PREDICATE} AND ci.id = $3"
        );

        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(session_key)
            .bind(item_id)
            .bind(quantity_to_db(quantity)?)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't belong to `owner`.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, owner: &CartOwner, item_id: CartItemId) -> Result<(), RepositoryError> {
        let (user_id, session_key) = owner_binds(owner);
        let sql = format!("DELETE FROM shop.cart_item ci WHERE {OWNER_PREDICATE} AND ci.id = $3");

        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(session_key)
            .bind(item_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove every line of a cart. Returns the number of deleted lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, owner: &CartOwner) -> Result<u64, RepositoryError> {
        let (user_id, session_key) = owner_binds(owner);
        let sql = format!("DELETE FROM shop.cart_item ci WHERE {OWNER_PREDICATE}");

        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(session_key)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Move a guest cart into a user's cart.
    ///
    /// Products already in the user's cart get the guest quantity added and
    /// the guest row removed (saturating at the column maximum). Remaining
    /// guest rows are re-owned by the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing
    /// is changed in that case.
    pub async fn merge_guest_cart(
        &self,
        session_key: &str,
        user_id: UserId,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            UPDATE shop.cart_item AS u
            SET quantity = LEAST(u.quantity::BIGINT + g.quantity, 2147483647)::INTEGER
            FROM shop.cart_item AS g
            WHERE u.user_id = $1
              AND g.user_id IS NULL
              AND g.session_key = $2
              AND g.product_id = u.product_id
            ",
        )
        .bind(user_id)
        .bind(session_key)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            DELETE FROM shop.cart_item AS g
            USING shop.cart_item AS u
            WHERE g.user_id IS NULL
              AND g.session_key = $2
              AND u.user_id = $1
              AND u.product_id = g.product_id
            ",
        )
        .bind(user_id)
        .bind(session_key)
        .execute(&mut *tx)
        .await?;

        let moved = sqlx::query(
            r"
            UPDATE shop.cart_item
            SET user_id = $1, session_key = NULL
            WHERE user_id IS NULL AND session_key = $2
            ",
        )
        .bind(user_id)
        .bind(session_key)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(moved.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_binds() {
        assert_eq!(owner_binds(&CartOwner::User(UserId::new(5))), (Some(5), None));
        assert_eq!(
            owner_binds(&CartOwner::Guest("k".to_string())),
            (None, Some("k"))
        );
    }
}
