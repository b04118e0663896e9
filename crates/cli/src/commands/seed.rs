//! Seed the admin account and the demo catalog.
//!
//! Reads the same environment as the storefront server, so
//! `BAZAAR_ADMIN_USERNAME`/`BAZAAR_ADMIN_PASSWORD` and `BAZAAR_SEED_CATALOG`
//! apply here too. Safe to run repeatedly.

use thiserror::Error;
use tracing::{info, warn};

use bazaar_storefront::config::{ConfigError, StorefrontConfig};
use bazaar_storefront::db::Database;
use bazaar_storefront::services::auth::AdminAccount;
use bazaar_storefront::services::seed::{self, SeedError};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedCommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Seeding failed: {0}")]
    Seed(#[from] SeedError),
}

/// Seed the configured database.
///
/// # Errors
///
/// Returns `SeedCommandError` if configuration is invalid or seeding fails.
pub async fn run(skip_catalog: bool) -> Result<(), SeedCommandError> {
    let config = StorefrontConfig::from_env()?;
    if config.uses_memory_database() {
        warn!("BAZAAR_DATABASE_URL selects the in-memory store; seeded data is discarded on exit");
    }

    let db = Database::connect(&config.database_url).await?;
    let report = seed::run(
        &db,
        config.admin.as_ref(),
        config.seed_catalog && !skip_catalog,
    )
    .await?;

    match report.admin {
        Some(AdminAccount::Created(user)) => info!(username = %user.username, "Created admin"),
        Some(AdminAccount::Existing(user)) => info!(username = %user.username, "Admin already present"),
        None => {}
    }
    info!(products_created = report.products_created, "Seeding complete!");
    Ok(())
}
