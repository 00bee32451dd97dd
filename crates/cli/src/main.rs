//! Mars Shop CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mars-cli migrate
//!
//! # Create a staff user for the sales dashboard
//! mars-cli user create -u ops --staff
//!
//! # Grant or revoke dashboard access
//! mars-cli user staff ops
//! mars-cli user staff ops --revoke
//!
//! # Import categories and products from YAML
//! mars-cli catalog import crates/cli/seed/catalog.yaml
//!
//! # List the catalog
//! mars-cli catalog list
//! ```
//!
//! # Environment Variables
//!
//! - `MARS_SHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `MARS_CLI_PASSWORD` - Password for `user create` when `--password` is omitted

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mars-cli")]
#[command(author, version, about = "Mars Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password (read from `MARS_CLI_PASSWORD` when omitted)
        #[arg(short, long, env = "MARS_CLI_PASSWORD", hide_env_values = true)]
        password: String,

        /// Allow access to the sales dashboard
        #[arg(long)]
        staff: bool,
    },
    /// Grant or revoke dashboard access
    Staff {
        /// Login name
        username: String,

        /// Revoke instead of grant
        #[arg(long)]
        revoke: bool,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Import categories and products from a YAML file
    Import {
        /// Path to the YAML file
        file: PathBuf,
    },
    /// List all products
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), commands::CliError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                password,
                staff,
            } => {
                commands::user::create(&username, &password, staff).await?;
            }
            UserAction::Staff { username, revoke } => {
                commands::user::set_staff(&username, !revoke).await?;
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Import { file } => commands::catalog::import(&file).await?,
            CatalogAction::List => commands::catalog::list().await?,
        },
    }
    Ok(())
}
