//! User repository for database operations.

use chrono::{DateTime, Utc};

use bazaar_core::{User, UserId, Username};

use super::{Database, RepositoryError};
use crate::models::UserRecord;

const USER_COLUMNS: &str = "id, username, password_hash, is_admin, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            user: User {
                id: row.id,
                username,
                is_admin: row.is_admin,
            },
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get a user and their password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
    pub async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let row = sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
                ))
                .bind(username.as_str())
                .fetch_optional(pool)
                .await?;
                row.map(UserRecord::try_from).transpose()
            }
            Database::Memory(memory) => Ok(memory.user_by_username(username).await),
        }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored username is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = match self.db {
            Database::Postgres(pool) => sqlx::query_as::<_, UserRow>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(UserRecord::try_from)
            .transpose()?,
            Database::Memory(memory) => memory.user_by_id(id).await,
        };
        Ok(record.map(|r| r.user))
    }

    /// Create a user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &Username,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, RepositoryError> {
        let record = match self.db {
            Database::Postgres(pool) => {
                let row = sqlx::query_as::<_, UserRow>(&format!(
                    "INSERT INTO users (username, password_hash, is_admin) \
                     VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
                ))
                .bind(username.as_str())
                .bind(password_hash)
                .bind(is_admin)
                .fetch_one(pool)
                .await
                .map_err(|e| RepositoryError::from_insert(e, "username already exists"))?;
                UserRecord::try_from(row)?
            }
            Database::Memory(memory) => {
                memory
                    .insert_user(username, password_hash, is_admin)
                    .await?
            }
        };
        Ok(record.user)
    }

    /// Number of registered accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(pool)
                    .await?;
                Ok(u64::try_from(count).unwrap_or_default())
            }
            Database::Memory(memory) => Ok(memory.user_count().await as u64),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Database::memory();
        let repo = UserRepository::new(&db);
        let username = Username::parse("mai").unwrap();

        let user = repo.create(&username, "$argon2id$stub", false).await.unwrap();
        assert!(!user.is_admin);

        let record = repo.get_by_username(&username).await.unwrap().unwrap();
        assert_eq!(record.user, user);
        assert_eq!(record.password_hash, "$argon2id$stub");

        assert_eq!(repo.get_by_id(user.id).await.unwrap(), Some(user));
        assert_eq!(repo.get_by_id(UserId::new(99)).await.unwrap(), None);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = Database::memory();
        let repo = UserRepository::new(&db);
        let username = Username::parse("mai").unwrap();

        repo.create(&username, "h", false).await.unwrap();
        let err = repo.create(&username, "h", true).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
