//! Product repository.

use bazaar_core::api::NewProduct;
use bazaar_core::{Price, Product, ProductId};
use url::Url;

use super::{Database, RepositoryError};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, external_link";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: i64,
    image_url: Option<String>,
    external_link: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price,
            image_url: parse_stored_url(row.image_url)?,
            external_link: parse_stored_url(row.external_link)?,
        })
    }
}

fn parse_stored_url(raw: Option<String>) -> Result<Option<Url>, RepositoryError> {
    raw.map(|s| {
        Url::parse(&s)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid URL in database: {e}")))
    })
    .transpose()
}

/// Repository for catalog operations.
pub struct ProductRepository<'a> {
    db: &'a Database,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let rows = sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
                ))
                .fetch_all(pool)
                .await?;
                rows.into_iter().map(Product::try_from).collect()
            }
            Database::Memory(memory) => Ok(memory.products().await),
        }
    }

    /// Number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
                    .fetch_one(pool)
                    .await?;
                Ok(u64::try_from(count).unwrap_or_default())
            }
            Database::Memory(memory) => Ok(memory.product_count().await as u64),
        }
    }

    /// Insert a validated product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let row = sqlx::query_as::<_, ProductRow>(&format!(
                    "INSERT INTO products (name, description, price, image_url, external_link) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
                ))
                .bind(product.name.as_str())
                .bind(&product.description)
                .bind(product.price.minor_units())
                .bind(product.image_url.as_ref().map(Url::as_str))
                .bind(product.external_link.as_ref().map(Url::as_str))
                .fetch_one(pool)
                .await?;
                Product::try_from(row)
            }
            Database::Memory(memory) => Ok(memory.insert_product(product).await),
        }
    }

    /// Delete a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM products WHERE id = $1")
                    .bind(id)
                    .execute(pool)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }
                Ok(())
            }
            Database::Memory(memory) => memory.delete_product(id).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::NonEmptyText;

    use super::*;

    fn balo() -> NewProduct {
        NewProduct {
            name: NonEmptyText::parse("Balo Thời Trang").unwrap(),
            description: "Balo đi học, đi chơi".to_string(),
            price: Price::new(150_000).unwrap(),
            image_url: None,
            external_link: Some(Url::parse("https://taobao.com").unwrap()),
        }
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let db = Database::memory();
        let repo = ProductRepository::new(&db);

        let product = repo.create(&balo()).await.unwrap();
        assert_eq!(product.name, "Balo Thời Trang");
        assert_eq!(repo.list().await.unwrap(), vec![product.clone()]);

        repo.delete(product.id).await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(product.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn test_row_with_negative_price_is_corrupt() {
        let row = ProductRow {
            id: ProductId::new(1),
            name: "x".to_string(),
            description: String::new(),
            price: -1,
            image_url: None,
            external_link: None,
        };
        assert!(matches!(
            Product::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
