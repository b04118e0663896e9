//! Catalog service.
//!
//! Product listing is public and hot, so it is served from a `moka` cache that
//! is invalidated whenever the admin adds or removes a product.
//!
//! Every invalidation bumps a generation counter. A listing read from the
//! database is only cached if no write landed while it was being read.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::debug;

use bazaar_core::api::{CreateProductRequest, FieldError};
use bazaar_core::{Product, ProductId};

use crate::db::{Database, ProductRepository, RepositoryError};

/// How long a cached listing is served before it is re-read.
const LISTING_TTL: Duration = Duration::from_secs(60);

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Listing,
}

/// Shared cache of the product listing.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, Arc<[Product]>>,
    generation: Arc<AtomicU64>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(LISTING_TTL)
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Drop the cached listing.
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(&CacheKey::Listing).await;
    }

    /// Number of invalidations so far.
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Cache `products`, read when the generation was `generation`.
    ///
    /// Returns whether the listing was kept. An invalidation racing the insert
    /// either sees the entry and drops it, or is seen by the re-check here.
    async fn fill(&self, generation: u64, products: Arc<[Product]>) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.cache.insert(CacheKey::Listing, products).await;
        if self.generation() != generation {
            self.cache.invalidate(&CacheKey::Listing).await;
            return false;
        }
        true
    }
}

/// Product catalog operations.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    cache: &'a CatalogCache,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(db: &'a Database, cache: &'a CatalogCache) -> Self {
        Self {
            products: ProductRepository::new(db),
            cache,
        }
    }

    /// All products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the listing cannot be read.
    pub async fn list(&self) -> Result<Arc<[Product]>, CatalogError> {
        if let Some(products) = self.cache.cache.get(&CacheKey::Listing).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let generation = self.cache.generation();
        let products: Arc<[Product]> = self.products.list().await?.into();
        if !self.cache.fill(generation, Arc::clone(&products)).await {
            debug!("Catalog changed during read, listing not cached");
        }
        Ok(products)
    }

    /// Validate and add a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` naming the first invalid field.
    pub async fn create(&self, request: CreateProductRequest) -> Result<Product, CatalogError> {
        let product = request.validate()?;
        let product = self.products.create(&product).await?;
        self.cache.invalidate().await;
        Ok(product)
    }

    /// Remove a product. Removing one that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        match self.products.delete(id).await {
            Ok(()) => self.cache.invalidate().await,
            Err(RepositoryError::NotFound) => debug!(%id, "Product already gone"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn request(name: &str, price: i64) -> CreateProductRequest {
        CreateProductRequest {
            name: name.to_string(),
            description: String::new(),
            price,
            image_url: None,
            external_link: None,
        }
    }

    #[tokio::test]
    async fn test_listing_reflects_writes() {
        let db = Database::memory();
        let cache = CatalogCache::default();
        let catalog = CatalogService::new(&db, &cache);

        assert!(catalog.list().await.unwrap().is_empty());

        let product = catalog.create(request("Balo", 150_000)).await.unwrap();
        assert_eq!(catalog.list().await.unwrap().len(), 1);

        catalog.delete(product.id).await.unwrap();
        assert!(catalog.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeat_delete_succeeds() {
        let db = Database::memory();
        let cache = CatalogCache::default();
        let catalog = CatalogService::new(&db, &cache);
        let kept = catalog.create(request("Túi tote", 90_000)).await.unwrap();
        let product = catalog.create(request("Balo", 150_000)).await.unwrap();

        catalog.delete(product.id).await.unwrap();
        catalog.delete(product.id).await.unwrap();
        catalog.delete(ProductId::new(999)).await.unwrap();

        let listing = catalog.list().await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_write_during_read_is_not_cached_over() {
        let db = Database::memory();
        let cache = CatalogCache::default();
        let catalog = CatalogService::new(&db, &cache);
        catalog.create(request("Balo", 150_000)).await.unwrap();

        // A listing read before the write lands
        let generation = cache.generation();
        let stale: Arc<[Product]> = ProductRepository::new(&db).list().await.unwrap().into();
        catalog.create(request("Túi tote", 90_000)).await.unwrap();

        assert!(!cache.fill(generation, stale).await);
        assert_eq!(catalog.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_is_cached_between_writes() {
        let db = Database::memory();
        let cache = CatalogCache::default();
        let catalog = CatalogService::new(&db, &cache);
        catalog.create(request("Balo", 150_000)).await.unwrap();

        let first = catalog.list().await.unwrap();
        let second = catalog.list().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_invalid_product_is_not_stored() {
        let db = Database::memory();
        let cache = CatalogCache::default();
        let catalog = CatalogService::new(&db, &cache);

        let err = catalog.create(request("Balo", -1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(ref e) if e.field == "price"));
        assert_eq!(ProductRepository::new(&db).count().await.unwrap(), 0);
    }
}
