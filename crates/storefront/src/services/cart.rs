//! Cart operations.

use sqlx::PgPool;

use mars_shop_core::{CartItemId, Price, ProductId, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::{Cart, CartOwner};

/// Quantity change requested by the cart page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityAction {
    Increase,
    Decrease,
    /// Any unrecognized action; leaves the line untouched.
    Keep,
}

impl QuantityAction {
    #[must_use]
    pub fn parse(action: &str) -> Self {
        match action {
            "increase" => Self::Increase,
            "decrease" => Self::Decrease,
            _ => Self::Keep,
        }
    }

    /// New quantity for a line, or `None` when the line should be deleted.
    #[must_use]
    pub const fn apply(self, quantity: u32) -> Option<u32> {
        match self {
            Self::Increase => Some(quantity.saturating_add(1)),
            Self::Decrease if quantity <= 1 => None,
            Self::Decrease => Some(quantity - 1),
            Self::Keep => Some(quantity),
        }
    }
}

/// Outcome of [`CartService::update_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    Updated {
        new_qty: u32,
        item_total: Price,
        cart_total: Price,
    },
    Deleted,
}

/// Cart service scoped to one owner.
pub struct CartService<'a> {
    pool: &'a PgPool,
    owner: CartOwner,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, owner: CartOwner) -> Self {
        Self { pool, owner }
    }

    const fn repo(&self) -> CartRepository<'a> {
        CartRepository::new(self.pool)
    }

    /// Load the cart with current product prices.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn contents(&self) -> Result<Cart, RepositoryError> {
        let lines = self.repo().list(&self.owner).await?;
        Ok(Cart::new(lines))
    }

    /// Sum of quantities for the header badge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn item_count(&self) -> Result<i64, RepositoryError> {
        self.repo().item_count(&self.owner).await
    }

    /// Add a product and return the new cart total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<Price, RepositoryError> {
        if ProductRepository::new(self.pool)
            .get_by_id(product_id)
            .await?
            .is_none()
        {
            return Err(RepositoryError::NotFound);
        }

        self.repo().add(&self.owner, product_id, quantity).await?;
        Ok(self.contents().await?.total())
    }

    /// Apply a quantity action to one of the owner's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line isn't in this cart.
    pub async fn update_quantity(
        &self,
        item_id: CartItemId,
        action: QuantityAction,
    ) -> Result<QuantityUpdate, RepositoryError> {
        let repo = self.repo();
        let line = repo
            .get_line(&self.owner, item_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let Some(new_qty) = action.apply(line.quantity) else {
            repo.delete(&self.owner, item_id).await?;
            return Ok(QuantityUpdate::Deleted);
        };

        if new_qty != line.quantity {
            repo.set_quantity(&self.owner, item_id, new_qty).await?;
        }

        let cart_total = self.contents().await?.total();

        Ok(QuantityUpdate::Updated {
            new_qty,
            item_total: line.product.price.times(new_qty),
            cart_total,
        })
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn clear(&self) -> Result<(), RepositoryError> {
        self.repo().clear(&self.owner).await?;
        Ok(())
    }
}

/// Move a guest cart into the user's cart after login.
///
/// # Errors
///
/// Returns `RepositoryError` if the merge transaction fails.
pub async fn merge_guest_cart(
    pool: &PgPool,
    session_key: &str,
    user_id: UserId,
) -> Result<u64, RepositoryError> {
    let moved = CartRepository::new(pool)
        .merge_guest_cart(session_key, user_id)
        .await?;

    tracing::debug!(%user_id, moved, "Merged guest cart");
    Ok(moved)
}
