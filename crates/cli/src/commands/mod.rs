//! Subcommand implementations.

pub mod admin;
pub mod inbox;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database URL from `BAZAAR_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
