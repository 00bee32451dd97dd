//! Checkout: turning a cart into an order.

use sqlx::PgPool;
use thiserror::Error;

use mars_shop_core::OrderId;

use crate::db::{OrderRepository, RepositoryError};
use crate::models::CartOwner;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart empty")]
    CartEmpty,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct CheckoutService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Place a completed order for everything in the owner's cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::CartEmpty` when there is nothing to buy.
    /// Returns `CheckoutError::Repository` if the transaction fails.
    pub async fn place_order(&self, owner: &CartOwner) -> Result<OrderId, CheckoutError> {
        self.orders
            .create_from_cart(owner)
            .await?
            .ok_or(CheckoutError::CartEmpty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_empty_message() {
        assert_eq!(CheckoutError::CartEmpty.to_string(), "cart empty");
    }
}
