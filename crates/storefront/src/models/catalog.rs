//! Catalog domain types.

use chrono::{DateTime, Utc};

use mars_shop_core::{CategoryId, Price, ProductId};

/// URL prefix under which product photos are served.
pub const MEDIA_URL: &str = "/media/";

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A product in the catalog.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Path relative to the media directory, if a photo was uploaded.
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Public URL of the product photo, or an empty string without one.
    #[must_use]
    pub fn photo_url(&self) -> String {
        match self.photo_path.as_deref() {
            Some(path) if !path.is_empty() => {
                format!("{MEDIA_URL}{}", path.trim_start_matches('/'))
            }
            _ => String::new(),
        }
    }
}
