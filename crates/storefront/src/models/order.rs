//! Order domain types.

use chrono::{DateTime, Utc};

use mars_shop_core::{OrderId, OrderItemId, OrderStatus, Price, UserId};

use super::catalog::Product;

/// A placed order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    /// `None` for guest checkouts and for orders of deleted users.
    pub user_id: Option<UserId>,
    pub total_price: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether the order was placed by `user_id`.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }
}

/// One product line of an order, priced at checkout time.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub id: OrderItemId,
    pub product: Product,
    pub quantity: u32,
    pub unit_price: Price,
}

impl OrderLine {
    /// Snapshotted unit price times quantity.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Total number of units across order lines.
#[must_use]
pub fn items_count(lines: &[OrderLine]) -> u32 {
    lines.iter().map(|line| line.quantity).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::fixtures::product;

    fn order_line(id: i32, unit_price: &str, quantity: u32) -> OrderLine {
        let product = product(id, "999.00");
        OrderLine {
            id: OrderItemId::new(id),
            unit_price: Price::new(unit_price.parse().unwrap_or_default()),
            product,
            quantity,
        }
    }

    #[test]
    fn test_line_total_uses_snapshotted_price() {
        // The product now costs 999.00, the order keeps the checkout price.
        assert_eq!(order_line(1, "3.00", 2).total_price().to_string(), "6.00");
    }

    #[test]
    fn test_items_count() {
        let lines = vec![order_line(1, "1", 2), order_line(2, "1", 3)];
        assert_eq!(items_count(&lines), 5);
        assert_eq!(items_count(&[]), 0);
    }

    #[test]
    fn test_is_owned_by() {
        let order = Order {
            id: OrderId::new(1),
            user_id: Some(UserId::new(4)),
            total_price: Price::ZERO,
            status: OrderStatus::Completed,
            created_at: Utc::now(),
        };
        assert!(order.is_owned_by(UserId::new(4)));
        assert!(!order.is_owned_by(UserId::new(5)));

        let guest_order = Order {
            user_id: None,
            ..order
        };
        assert!(!guest_order.is_owned_by(UserId::new(4)));
    }
}
