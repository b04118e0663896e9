//! Persistence for users, products and messages.
//!
//! Two interchangeable backends sit behind one [`Database`] handle:
//!
//! - `PostgreSQL` through a sqlx pool, for production
//! - [`MemoryDb`], an in-process store used by tests and local demos
//!
//! Repositories borrow the handle and dispatch on the backend, so services
//! never know which one they are talking to.
//!
//! ## Tables
//!
//! - `users` - Accounts with Argon2 password hashes
//! - `products` - The catalog
//! - `messages` - Append-only chat log
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod memory;
pub mod messages;
pub mod products;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::MEMORY_DATABASE_URL;

pub use memory::MemoryDb;
pub use messages::MessageRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
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
}

impl RepositoryError {
    /// Map a sqlx error, turning unique violations into `Conflict`.
    pub(crate) fn from_insert(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Handle to whichever storage backend the server runs on.
///
/// Cheap to clone.
#[derive(Debug, Clone)]
pub enum Database {
    Postgres(PgPool),
    Memory(Arc<MemoryDb>),
}

impl Database {
    /// Connect to the backend named by `database_url`.
    ///
    /// `memory://` selects a fresh in-process store; anything else is handed
    /// to the `PostgreSQL` driver.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if the pool cannot be established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, sqlx::Error> {
        if database_url.expose_secret().starts_with(MEMORY_DATABASE_URL) {
            return Ok(Self::memory());
        }
        Ok(Self::Postgres(create_pool(database_url).await?))
    }

    /// A fresh, empty in-process store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryDb::default()))
    }

    /// The `PostgreSQL` pool, if this is the `PostgreSQL` backend.
    #[must_use]
    pub const fn postgres(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(pool) => Some(pool),
            Self::Memory(_) => None,
        }
    }

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if `PostgreSQL` does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }

    /// Drop all data. Only the memory backend supports this.
    ///
    /// Returns `false` for `PostgreSQL`, which is never wiped from here.
    pub async fn reset(&self) -> bool {
        match self {
            Self::Memory(memory) => {
                memory.reset().await;
                true
            }
            Self::Postgres(_) => false,
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_url_selects_memory_backend() {
        let db = Database::connect(&SecretString::from("memory://"))
            .await
            .expect("memory backend never fails");
        assert!(db.postgres().is_none());
        assert!(db.ping().await.is_ok());
        assert!(db.reset().await);
    }
}
