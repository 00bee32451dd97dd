//! Database migration command.
//!
//! Applies `crates/storefront/migrations/`, which create the `shop` schema
//! and the `tower_sessions` session table.

use super::{CliError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
