//! Catalog import and listing.
//!
//! # File Format
//!
//! ```yaml
//! categories:
//!   - name: Rovers
//!     products:
//!       - name: Dune Buggy
//!         description: Two-seat pressurized rover.
//!         price: "12999.00"
//!         photo: products/dune-buggy.jpg   # optional, relative to the media dir
//! ```
//!
//! Categories are matched by name. Products already present in their
//! category (same name) are skipped, so re-running an import is safe.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use mars_shop_core::Price;
use mars_shop_storefront::db::{CategoryRepository, ProductRepository};

use super::{CliError, connect};

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default)]
    pub products: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ProductEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub photo: Option<String>,
}

/// Problems that make a catalog file unusable.
pub fn validate(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    for category in &catalog.categories {
        if category.name.trim().is_empty() {
            errors.push("category with an empty name".to_owned());
        }

        for product in &category.products {
            if product.name.trim().is_empty() {
                errors.push(format!("product with an empty name in '{}'", category.name));
            }
            if product.price.is_sign_negative() {
                errors.push(format!("'{}' has a negative price", product.name));
            }
            if product.price.scale() > 2 {
                errors.push(format!("'{}' has more than two decimal places", product.name));
            }
        }
    }

    errors
}

/// Import a catalog file.
pub async fn import(path: &Path) -> Result<(), CliError> {
    tracing::info!(path = %path.display(), "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    // Validate before connecting to the database
    let errors = validate(&catalog);
    if !errors.is_empty() {
        tracing::error!("Catalog validation failed:");
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(CliError::Invalid(format!("{} validation errors found", errors.len())));
    }

    let pool = connect().await?;
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for entry in &catalog.categories {
        let category = categories.get_or_create(entry.name.trim()).await?;

        for product in &entry.products {
            let name = product.name.trim();
            if products.exists_in_category(category.id, name).await? {
                skipped += 1;
                continue;
            }

            products
                .create(
                    category.id,
                    name,
                    product.description.trim(),
                    Price::new(product.price),
                    product.photo.as_deref(),
                )
                .await?;
            inserted += 1;
        }
    }

    tracing::info!("Import complete!");
    tracing::info!("  Categories: {}", catalog.categories.len());
    tracing::info!("  Products inserted: {inserted}");
    tracing::info!("  Products skipped (already exist): {skipped}");
    Ok(())
}

/// Log every product, newest first.
pub async fn list() -> Result<(), CliError> {
    let pool = connect().await?;
    let products = ProductRepository::new(&pool).list_all().await?;

    tracing::info!("{} products", products.len());
    for product in &products {
        tracing::info!(
            "  #{} {} [{}] ${}",
            product.id,
            product.name,
            product.category_name,
            product.price
        );
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
categories:
  - name: Suits
    products:
      - name: EVA Suit
        description: Rated for 8 hours outside.
        price: "4999.50"
      - name: Helmet
        price: 899
        photo: products/helmet.jpg
  - name: Empty
"#;

    #[test]
    fn test_parse_sample() {
        let catalog: CatalogFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(catalog.categories.len(), 2);

        let suits = &catalog.categories[0];
        assert_eq!(suits.products.len(), 2);
        assert_eq!(suits.products[0].price.to_string(), "4999.50");
        assert_eq!(suits.products[1].description, "");
        assert_eq!(suits.products[1].photo.as_deref(), Some("products/helmet.jpg"));
        assert!(catalog.categories[1].products.is_empty());
        assert!(validate(&catalog).is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let catalog = CatalogFile {
            categories: vec![CategoryEntry {
                name: " ".to_owned(),
                products: vec![ProductEntry {
                    name: "Cheap".to_owned(),
                    description: String::new(),
                    price: "-1.005".parse().unwrap(),
                    photo: None,
                }],
            }],
        };
        let errors = validate(&catalog);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_seed_file_is_valid() {
        let catalog: CatalogFile =
            serde_yaml::from_str(include_str!("../../seed/catalog.yaml")).unwrap();
        assert!(!catalog.categories.is_empty());
        assert!(validate(&catalog).is_empty());
    }
}
