//! CLI command implementations.

pub mod catalog;
pub mod migrate;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use mars_shop_storefront::db::{self, RepositoryError};

/// Errors shared by all commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Input rejected before touching the database.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Catalog file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Catalog file is not valid YAML for the expected shape.
    #[error("Invalid catalog file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Database URL from `MARS_SHOP_DATABASE_URL`, falling back to `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, CliError> {
    dotenvy::dotenv().ok();

    std::env::var("MARS_SHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("MARS_SHOP_DATABASE_URL"))
}

/// Connect using [`database_url`].
pub async fn connect() -> Result<PgPool, CliError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
