//! Database operations for the shop `PostgreSQL` database.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `user` - Site accounts (username, argon2 hash, staff flag)
//! - `category`, `product` - The catalog
//! - `cart_item` - Cart rows owned by a user or a guest cart key
//! - `order`, `order_item` - Placed orders with snapshotted unit prices
//! - `review` - One review per user and product
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p mars-shop-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod stats;
pub mod users;

pub use cart::CartRepository;
pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::{ProductFilter, ProductRepository, ProductSort};
pub use reviews::ReviewRepository;
pub use stats::StatsRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A value does not fit its column.
    #[error("out of range: {0}")]
    OutOfRange(String),
}

/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Map a unique violation to [`RepositoryError::Conflict`].
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Map an integer overflow inside the database to [`RepositoryError::OutOfRange`].
fn out_of_range(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE)
    {
        return RepositoryError::OutOfRange(format!("{what} too large"));
    }
    RepositoryError::Database(e)
}

/// Convert a stored quantity to `u32`.
fn quantity_from_db(quantity: i32) -> Result<u32, RepositoryError> {
    u32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative quantity: {quantity}")))
}

/// Convert a quantity to the `INTEGER` column type.
fn quantity_to_db(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::OutOfRange(format!("quantity too large: {quantity}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
