//! First-boot seeding.
//!
//! Creates the admin account when credentials are configured, and fills an
//! empty catalog with the demo products. Both steps are idempotent: running
//! the seed twice creates nothing the second time.

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, warn};

use bazaar_core::api::{CreateProductRequest, FieldError};
use bazaar_core::User;

use super::auth::{AdminAccount, AuthError, AuthService};
use crate::config::AdminSeedConfig;
use crate::db::{Database, ProductRepository, RepositoryError};

const DEMO_LINK: &str = "https://taobao.com";

/// Products added to an empty catalog: `(name, description, price, image)`.
pub const DEMO_CATALOG: [(&str, &str, i64, &str); 3] = [
    (
        "Áo Thun Ulzzang Form Rộng",
        "Áo thun nam nữ form rộng tay lỡ style hàn quốc",
        99_000,
        "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=500&h=500&fit=crop",
    ),
    (
        "Giày Sneaker Nam Nữ",
        "Giày thể thao nam nữ bản đẹp chuẩn",
        250_000,
        "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=500&h=500&fit=crop",
    ),
    (
        "Balo Thời Trang",
        "Balo nam nữ thời trang đi học đi làm siêu bền",
        150_000,
        "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=500&h=500&fit=crop",
    ),
];

/// Errors that abort seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("admin account: {0}")]
    Admin(#[from] AuthError),

    #[error("demo product: {0}")]
    InvalidDemoProduct(#[from] FieldError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What a seed run changed.
#[derive(Debug, Default)]
pub struct SeedReport {
    /// The admin account, if admin credentials were configured.
    pub admin: Option<AdminAccount>,
    /// Number of demo products inserted.
    pub products_created: usize,
}

/// Seed the admin account and, if requested, the demo catalog.
///
/// # Errors
///
/// Returns `SeedError` if the admin cannot be created or storage fails.
pub async fn run(
    db: &Database,
    admin: Option<&AdminSeedConfig>,
    seed_catalog: bool,
) -> Result<SeedReport, SeedError> {
    let admin = match admin {
        Some(config) => Some(ensure_admin(db, config).await?),
        None => {
            warn!("No admin credentials configured; skipping admin seeding");
            None
        }
    };

    let products_created = if seed_catalog {
        seed_catalog_if_empty(db).await?
    } else {
        0
    };

    Ok(SeedReport {
        admin,
        products_created,
    })
}

async fn ensure_admin(db: &Database, config: &AdminSeedConfig) -> Result<AdminAccount, SeedError> {
    let account = AuthService::new(db)
        .ensure_admin(&config.username, config.password.expose_secret())
        .await?;

    match &account {
        AdminAccount::Created(user) => info!(user_id = %user.id, "Admin account created"),
        AdminAccount::Existing(User { is_admin: true, .. }) => {
            info!("Admin account already exists");
        }
        AdminAccount::Existing(user) => warn!(
            user_id = %user.id,
            "Configured admin username belongs to a non-admin account"
        ),
    }
    Ok(account)
}

/// Insert the demo products when the catalog has none.
///
/// # Errors
///
/// Returns `SeedError::Repository` if the catalog cannot be read or written.
pub async fn seed_catalog_if_empty(db: &Database) -> Result<usize, SeedError> {
    let products = ProductRepository::new(db);
    if products.count().await? > 0 {
        info!("Catalog already populated; skipping demo products");
        return Ok(0);
    }

    for (name, description, price, image) in DEMO_CATALOG {
        let product = CreateProductRequest {
            name: name.to_owned(),
            description: description.to_owned(),
            price,
            image_url: Some(image.to_owned()),
            external_link: Some(DEMO_LINK.to_owned()),
        }
        .validate()?;
        products.create(&product).await?;
    }

    info!(count = DEMO_CATALOG.len(), "Seeded demo catalog");
    Ok(DEMO_CATALOG.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn admin_config() -> AdminSeedConfig {
        AdminSeedConfig {
            username: "owner".to_string(),
            password: SecretString::from("Kh0-Hang!9x"),
        }
    }

    #[tokio::test]
    async fn test_seeding_twice_creates_nothing_new() {
        let db = Database::memory();

        let first = run(&db, Some(&admin_config()), true).await.unwrap();
        assert!(matches!(first.admin, Some(AdminAccount::Created(_))));
        assert_eq!(first.products_created, 3);

        let second = run(&db, Some(&admin_config()), true).await.unwrap();
        assert!(matches!(second.admin, Some(AdminAccount::Existing(_))));
        assert_eq!(second.products_created, 0);
        assert_eq!(ProductRepository::new(&db).count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_demo_prices() {
        let db = Database::memory();
        seed_catalog_if_empty(&db).await.unwrap();

        let prices: Vec<i64> = ProductRepository::new(&db)
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.price.minor_units())
            .collect();
        assert_eq!(prices, vec![99_000, 250_000, 150_000]);
    }

    #[tokio::test]
    async fn test_catalog_seeding_can_be_disabled() {
        let db = Database::memory();
        let report = run(&db, None, false).await.unwrap();
        assert!(report.admin.is_none());
        assert_eq!(report.products_created, 0);
    }
}
