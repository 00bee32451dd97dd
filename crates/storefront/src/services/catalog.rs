//! Catalog browsing: query parsing and pagination.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use mars_shop_core::CategoryId;

use crate::db::{CategoryRepository, ProductFilter, ProductRepository, ProductSort, RepositoryError};
use crate::models::{Category, Product};

/// Products shown per catalog page.
pub const PAGE_SIZE: u32 = 12;

/// Raw catalog query string. Every field is kept as text so bad input can be
/// ignored instead of rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogParams {
    pub q: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

/// Parsed catalog query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub filter: ProductFilter,
    pub sort: ProductSort,
    /// Requested page as given; resolved against the result count later.
    pub page: Option<i64>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl CatalogQuery {
    /// Parse raw parameters, dropping anything unparsable.
    #[must_use]
    pub fn parse(params: &CatalogParams) -> Self {
        let filter = ProductFilter {
            search: non_empty(params.q.as_ref()).map(str::to_owned),
            min_price: non_empty(params.min_price.as_ref()).and_then(|s| s.parse::<Decimal>().ok()),
            max_price: non_empty(params.max_price.as_ref()).and_then(|s| s.parse::<Decimal>().ok()),
            category: non_empty(params.category.as_ref())
                .and_then(|s| s.parse::<i32>().ok())
                .map(CategoryId::new),
        };

        Self {
            filter,
            sort: ProductSort::parse(params.sort.as_deref().unwrap_or_default()),
            page: non_empty(params.page.as_ref()).and_then(|s| s.parse::<i64>().ok()),
        }
    }
}

/// Position within a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl Page {
    /// Resolve a requested page against a result count.
    ///
    /// Missing input means the first page. Numbers outside `1..=num_pages`
    /// fall back to the last page. An empty listing still has one page.
    #[must_use]
    pub fn resolve(requested: Option<i64>, total: i64) -> Self {
        let per_page = i64::from(PAGE_SIZE);
        let num_pages = ((total.max(0) + per_page - 1) / per_page).max(1);
        let number = match requested {
            None => 1,
            Some(n) if (1..=num_pages).contains(&n) => n,
            Some(_) => num_pages,
        };

        Self {
            number,
            num_pages,
            total,
        }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.number - 1) * i64::from(PAGE_SIZE)
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    #[must_use]
    pub const fn previous(&self) -> i64 {
        self.number - 1
    }

    #[must_use]
    pub const fn next(&self) -> i64 {
        self.number + 1
    }
}

/// One rendered catalog page.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub page: Page,
}

/// Load one catalog page for a query.
///
/// # Errors
///
/// Returns `RepositoryError` if a query fails.
pub async fn browse(pool: &PgPool, query: &CatalogQuery) -> Result<CatalogPage, RepositoryError> {
    let products = ProductRepository::new(pool);

    let total = products.count(&query.filter).await?;
    let page = Page::resolve(query.page, total);
    let items = products
        .list(&query.filter, query.sort, i64::from(PAGE_SIZE), page.offset())
        .await?;
    let categories = CategoryRepository::new(pool).list().await?;

    Ok(CatalogPage {
        products: items,
        categories,
        page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> CatalogParams {
        let mut p = CatalogParams::default();
        for (k, v) in pairs {
            let v = Some((*v).to_string());
            match *k {
                "q" => p.q = v,
                "min_price" => p.min_price = v,
                "max_price" => p.max_price = v,
                "category" => p.category = v,
                "sort" => p.sort = v,
                "page" => p.page = v,
                _ => {}
            }
        }
        p
    }

    #[test]
    fn test_parse_full_query() {
        let query = CatalogQuery::parse(&params(&[
            ("q", "  dust  "),
            ("min_price", "1.50"),
            ("max_price", "20"),
            ("category", "3"),
            ("sort", "price_desc"),
            ("page", "2"),
        ]));
        assert_eq!(query.filter.search.as_deref(), Some("dust"));
        assert_eq!(query.filter.min_price, Some(Decimal::new(150, 2)));
        assert_eq!(query.filter.max_price, Some(Decimal::from(20)));
        assert_eq!(query.filter.category, Some(CategoryId::new(3)));
        assert_eq!(query.sort, ProductSort::PriceDesc);
        assert_eq!(query.page, Some(2));
    }

    #[test]
    fn test_parse_ignores_garbage() {
        let query = CatalogQuery::parse(&params(&[
            ("q", "   "),
            ("min_price", "cheap"),
            ("max_price", ""),
            ("category", "rovers"),
            ("sort", "random"),
            ("page", "two"),
        ]));
        assert_eq!(query, CatalogQuery::default());
    }

    #[test]
    fn test_page_resolution() {
        assert_eq!(Page::resolve(None, 30).number, 1);
        assert_eq!(Page::resolve(Some(2), 30).number, 2);
        assert_eq!(Page::resolve(Some(99), 30).number, 3);
        assert_eq!(Page::resolve(Some(0), 30).number, 3);
        assert_eq!(Page::resolve(Some(-4), 30).number, 3);
    }

    #[test]
    fn test_page_counts() {
        assert_eq!(Page::resolve(None, 0).num_pages, 1);
        assert_eq!(Page::resolve(None, 12).num_pages, 1);
        assert_eq!(Page::resolve(None, 13).num_pages, 2);
    }

    #[test]
    fn test_page_navigation() {
        let page = Page::resolve(Some(2), 30);
        assert_eq!(page.offset(), 12);
        assert!(page.has_previous());
        assert!(page.has_next());
        assert_eq!(page.previous(), 1);
        assert_eq!(page.next(), 3);

        let last = Page::resolve(Some(3), 30);
        assert!(!last.has_next());
        let first = Page::resolve(None, 30);
        assert!(!first.has_previous());
        assert_eq!(first.offset(), 0);
    }
}
