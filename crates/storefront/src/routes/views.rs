//! Display data for templates.
//!
//! Templates receive pre-formatted strings so money and dates render the
//! same everywhere.

use crate::models::{CartLine, Category, Product, Review};
use crate::services::reviews::ReviewStatus;

/// Product display data.
#[derive(Clone, Debug)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category_name: String,
    /// Two-decimal amount without currency sign.
    pub price: String,
    /// Empty when the product has no photo.
    pub photo_url: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone(),
            category_name: product.category_name.clone(),
            price: product.price.to_string(),
            photo_url: product.photo_url(),
        }
    }
}

/// Cart line display data.
#[derive(Clone, Debug)]
pub struct CartLineView {
    pub id: i32,
    pub product: ProductView,
    pub quantity: u32,
    pub total_price: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.as_i32(),
            product: ProductView::from(&line.product),
            quantity: line.quantity,
            total_price: line.total_price().to_string(),
        }
    }
}

/// Review display data.
#[derive(Clone, Debug)]
pub struct ReviewView {
    pub username: String,
    pub rating: u8,
    pub stars: String,
    pub text: String,
    pub created_at: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        let filled = usize::from(review.rating.value());
        Self {
            username: review.username.to_string(),
            rating: review.rating.value(),
            stars: format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled.min(5))),
            text: review.text.clone(),
            created_at: review.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Category option in the catalog filter.
#[derive(Clone, Debug)]
pub struct CategoryOption {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

impl CategoryOption {
    pub fn list(categories: &[Category], active: Option<i32>) -> Vec<Self> {
        categories
            .iter()
            .map(|c| Self {
                id: c.id.as_i32(),
                name: c.name.clone(),
                selected: active == Some(c.id.as_i32()),
            })
            .collect()
    }
}

/// Product in an order with its review state.
#[derive(Clone, Debug)]
pub struct ReviewStatusView {
    pub product: ProductView,
    pub quantity: u32,
    pub has_review: bool,
}

impl ReviewStatusView {
    pub fn new(status: &ReviewStatus, quantity: u32) -> Self {
        Self {
            product: ProductView::from(&status.product),
            quantity,
            has_review: status.reviewed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::fixtures::product;

    #[test]
    fn test_product_view_formats_price() {
        let view = ProductView::from(&product(7, "3.5"));
        assert_eq!(view.id, 7);
        assert_eq!(view.price, "3.50");
        assert_eq!(view.photo_url, "");
    }

    #[test]
    fn test_category_options_mark_active() {
        let categories = vec![
            Category {
                id: mars_shop_core::CategoryId::new(1),
                name: "Rovers".to_string(),
            },
            Category {
                id: mars_shop_core::CategoryId::new(2),
                name: "Suits".to_string(),
            },
        ];
        let options = CategoryOption::list(&categories, Some(2));
        assert!(!options[0].selected);
        assert!(options[1].selected);
    }
}
