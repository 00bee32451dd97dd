//! Cart domain types.
//!
//! A cart is owned either by a logged-in user or by a guest cart key kept in
//! the session. Guest rows are re-owned by the user on login.

use mars_shop_core::{CartItemId, Price, UserId};

use super::catalog::Product;

/// Who a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    /// Cart of a logged-in user.
    User(UserId),
    /// Guest cart identified by the session's cart key.
    Guest(String),
}

impl CartOwner {
    /// The user id for user carts.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// The cart key for guest carts.
    #[must_use]
    pub fn session_key(&self) -> Option<&str> {
        match self {
            Self::User(_) => None,
            Self::Guest(key) => Some(key),
        }
    }
}

/// One product line in a cart.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: CartItemId,
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Current product price times quantity.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// A loaded cart.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Create a cart from its lines.
    #[must_use]
    pub const fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::total_price).sum()
    }

    /// Sum of all quantities (the badge count in the header).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::fixtures::product;

    fn line(id: i32, price: &str, quantity: u32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            product: product(id, price),
            quantity,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line(1, "2.50", 4).total_price().to_string(), "10.00");
    }

    #[test]
    fn test_cart_total_is_sum_of_line_totals() {
        let cart = Cart::new(vec![line(1, "2.50", 4), line(2, "0.99", 3), line(3, "100", 1)]);
        let expected: Price = cart.lines.iter().map(CartLine::total_price).sum();
        assert_eq!(cart.total(), expected);
        assert_eq!(cart.total().to_string(), "112.97");
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let cart = Cart::new(vec![line(1, "1", 2), line(2, "1", 5)]);
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn test_owner_accessors() {
        let user = CartOwner::User(UserId::new(9));
        assert_eq!(user.user_id(), Some(UserId::new(9)));
        assert_eq!(user.session_key(), None);

        let guest = CartOwner::Guest("abc".to_string());
        assert_eq!(guest.user_id(), None);
        assert_eq!(guest.session_key(), Some("abc"));
    }
}
