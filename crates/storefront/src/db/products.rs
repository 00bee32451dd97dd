//! Product repository: catalog listing, filtering and lookup.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use mars_shop_core::{CategoryId, Price, ProductId};

use super::RepositoryError;
use crate::models::Product;

/// Columns selected for every product query, joined with its category.
pub(crate) const PRODUCT_COLUMNS: &str = "p.id AS product_id, p.category_id, \
     c.name AS category_name, p.name AS product_name, p.description, p.price, \
     p.photo_path, p.created_at AS product_created_at";

/// A product joined with its category name.
///
/// Column names are prefixed so the row can be flattened into other rows.
#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    product_id: i32,
    category_id: i32,
    category_name: String,
    product_name: String,
    description: String,
    price: Price,
    photo_path: Option<String>,
    product_created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.product_id),
            category_id: CategoryId::new(row.category_id),
            category_name: row.category_name,
            name: row.product_name,
            description: row.description,
            price: row.price,
            photo_path: row.photo_path,
            created_at: row.product_created_at,
        }
    }
}

/// Catalog filters. `None` fields do not restrict the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub category: Option<CategoryId>,
}

/// Catalog ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// Parse the `sort` query parameter; unknown values mean newest first.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            _ => Self::Newest,
        }
    }

    /// Value echoed back into the sort selector.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "new",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
        }
    }

    const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY p.created_at DESC, p.id DESC",
            Self::PriceAsc => " ORDER BY p.price ASC, p.id ASC",
            Self::PriceDesc => " ORDER BY p.price DESC, p.id DESC",
        }
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    builder.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND p.price <= ").push_bind(max);
    }
    if let Some(category) = filter.category {
        builder.push(" AND p.category_id = ").push_bind(category);
    }
}

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p \
             JOIN shop.category c ON c.id = p.category_id \
             WHERE p.id = $1"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// List every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p \
             JOIN shop.category c ON c.id = p.category_id{}",
            ProductSort::Newest.order_by()
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Count products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &ProductFilter) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.product p");
        push_filters(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// List one page of products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product p \
             JOIN shop.category c ON c.id = p.category_id"
        ));
        push_filters(&mut builder, filter);
        builder
            .push(sort.order_by())
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Whether a product with this name already exists in the category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_in_category(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM shop.product WHERE category_id = $1 AND name = $2)",
        )
        .bind(category_id)
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        category_id: CategoryId,
        name: &str,
        description: &str,
        price: Price,
        photo_path: Option<&str>,
    ) -> Result<ProductId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.product (category_id, name, description, price, photo_path)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(category_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(photo_path)
        .fetch_one(self.pool)
        .await?;

        Ok(ProductId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("rover"), "rover");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(ProductSort::parse("price_asc"), ProductSort::PriceAsc);
        assert_eq!(ProductSort::parse("price_desc"), ProductSort::PriceDesc);
        assert_eq!(ProductSort::parse("new"), ProductSort::Newest);
        assert_eq!(ProductSort::parse("bogus"), ProductSort::Newest);
        assert_eq!(ProductSort::parse(""), ProductSort::Newest);
    }

    #[test]
    fn test_filters_sql() {
        let filter = ProductFilter {
            search: Some("dust".to_string()),
            min_price: Some(Decimal::ONE),
            max_price: None,
            category: Some(CategoryId::new(2)),
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM shop.product p");
        push_filters(&mut builder, &filter);
        let sql = builder.sql();
        assert!(sql.contains("p.name ILIKE $1 OR p.description ILIKE $2"));
        assert!(sql.contains("p.price >= $3"));
        assert!(!sql.contains("p.price <="));
        assert!(sql.contains("p.category_id = $4"));
    }

    #[test]
    fn test_no_filters() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM shop.product p");
        push_filters(&mut builder, &ProductFilter::default());
        assert_eq!(builder.sql(), "SELECT 1 FROM shop.product p WHERE TRUE");
    }
}
