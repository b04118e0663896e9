//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar admin create -u owner -p 'a-long-passphrase'
//! ```
//!
//! # Environment Variables
//!
//! - `BAZAAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)

use secrecy::ExposeSecret;
use thiserror::Error;

use bazaar_core::UserId;
use bazaar_storefront::config::MEMORY_DATABASE_URL;
use bazaar_storefront::db::Database;
use bazaar_storefront::services::auth::{AuthError, AuthService};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// The in-memory store would discard the account on exit.
    #[error("Refusing to create an admin in the in-memory store")]
    MemoryBackend,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// User already exists.
    #[error("User already exists with username: {0}")]
    UserExists(String),

    /// Username or password rejected.
    #[error("{0}")]
    Auth(AuthError),
}

/// Create a new admin user.
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns `AdminError` if the database is unreachable, the username is taken,
/// or the credentials are invalid.
pub async fn create_user(username: &str, password: &str) -> Result<UserId, AdminError> {
    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("BAZAAR_DATABASE_URL"))?;
    if database_url.expose_secret().starts_with(MEMORY_DATABASE_URL) {
        return Err(AdminError::MemoryBackend);
    }

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    tracing::info!("Creating admin user: {}", username);
    let user = AuthService::new(&db)
        .create_admin(username, password)
        .await
        .map_err(|e| match e {
            AuthError::UsernameTaken => AdminError::UserExists(username.to_owned()),
            other => AdminError::Auth(other),
        })?;

    tracing::info!(user_id = %user.id, "Admin user created");
    Ok(user.id)
}
