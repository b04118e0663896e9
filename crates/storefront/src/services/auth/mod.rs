//! Authentication service.
//!
//! Password registration and login against Argon2id hashes. Session binding
//! happens in the route layer; this service only decides who someone is.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use bazaar_core::{User, UserId, Username};

use crate::db::{Database, RepositoryError, UserRepository};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash verified against when the username is unknown, so a miss costs as
/// much as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("bazaar-dummy-password").ok());

/// Outcome of [`AuthService::ensure_admin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAccount {
    /// The account was created just now.
    Created(User),
    /// An account with that username already existed and was left untouched.
    Existing(User),
}

impl AdminAccount {
    #[must_use]
    pub const fn user(&self) -> &User {
        match self {
            Self::Created(user) | Self::Existing(user) => user,
        }
    }
}

/// Authentication service.
///
/// Handles registration, login and identity lookups.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            users: UserRepository::new(db),
        }
    }

    /// Register a new buyer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UsernameTaken` if the username is already registered.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        self.create_account(username, password, false).await
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_admin(&self, username: &str, password: &str) -> Result<User, AuthError> {
        self.create_account(username, password, true).await
    }

    /// Create the admin account unless the username is already taken.
    ///
    /// # Errors
    ///
    /// Returns the validation errors of [`AuthService::register`] and
    /// `AuthError::Repository` if storage fails.
    pub async fn ensure_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminAccount, AuthError> {
        let parsed = Username::parse(username)?;
        if let Some(existing) = self.users.get_by_username(&parsed).await? {
            return Ok(AdminAccount::Existing(existing.user));
        }

        match self.create_admin(username, password).await {
            Ok(user) => Ok(AdminAccount::Created(user)),
            // Lost a race with another process creating the same account
            Err(AuthError::UsernameTaken) => {
                let existing = self
                    .users
                    .get_by_username(&parsed)
                    .await?
                    .ok_or(AuthError::UserNotFound)?;
                Ok(AdminAccount::Existing(existing.user))
            }
            Err(e) => Err(e),
        }
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        // A malformed username can never match an account
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let Some(record) = self.users.get_by_username(&username).await? else {
            return Err(reject_unknown_user(password));
        };

        verify_password(password, &record.password_hash)?;

        Ok(record.user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(&username, &password_hash, is_admin)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password meets minimum requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Burn one verification on the dummy hash, then reject.
fn reject_unknown_user(password: &str) -> AuthError {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("bánh mì").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("bánh mì", &hash).is_ok());
        assert!(matches!(
            verify_password("banh mi", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_user_still_verifies_a_hash() {
        let dummy = DUMMY_HASH.as_deref().unwrap();
        let parsed = PasswordHash::new(dummy).unwrap();
        assert_eq!(parsed.algorithm, argon2::Algorithm::Argon2id.ident());
        assert!(matches!(
            verify_password("hoa-secret", dummy),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            reject_unknown_user("hoa-secret"),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        // Five multi-byte characters are still too short
        assert!(validate_password("ááááá").is_err());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let db = Database::memory();
        let auth = AuthService::new(&db);

        let user = auth.register("hoa", "hoa-secret").await.unwrap();
        assert!(!user.is_admin);
        assert_eq!(user.username.as_str(), "hoa");

        let logged_in = auth.login("hoa", "hoa-secret").await.unwrap();
        assert_eq!(logged_in, user);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let db = Database::memory();
        let auth = AuthService::new(&db);
        auth.register("hoa", "hoa-secret").await.unwrap();

        assert!(matches!(
            auth.login("hoa", "wrong-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "hoa-secret").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("bad name", "hoa-secret").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let db = Database::memory();
        let auth = AuthService::new(&db);
        auth.register("hoa", "hoa-secret").await.unwrap();

        assert!(matches!(
            auth.register("hoa", "another-one").await,
            Err(AuthError::UsernameTaken)
        ));
        assert_eq!(UserRepository::new(&db).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let db = Database::memory();
        let auth = AuthService::new(&db);

        assert!(matches!(
            auth.register("", "hoa-secret").await,
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(matches!(
            auth.register("hoa", "123").await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let db = Database::memory();
        let auth = AuthService::new(&db);

        let first = auth.ensure_admin("owner", "Tr0ng-Kho!").await.unwrap();
        assert!(matches!(first, AdminAccount::Created(_)));
        assert!(first.user().is_admin);

        let second = auth.ensure_admin("owner", "Tr0ng-Kho!").await.unwrap();
        assert_eq!(second, AdminAccount::Existing(first.user().clone()));
    }

    #[tokio::test]
    async fn test_get_user_missing() {
        let db = Database::memory();
        let auth = AuthService::new(&db);
        assert!(matches!(
            auth.get_user(UserId::new(7)).await,
            Err(AuthError::UserNotFound)
        ));
    }
}
