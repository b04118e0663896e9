//! Stored user accounts.

use chrono::{DateTime, Utc};

use bazaar_core::User;

/// A user row together with its credential.
///
/// Only the auth service reads `password_hash`; everything else works with the
/// public [`User`]. `Debug` is implemented manually to redact the hash.
#[derive(Clone)]
pub struct UserRecord {
    pub user: User,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("user", &self.user)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}
