//! Catalog route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
};

use bazaar_core::api::{CreateProductRequest, DeleteResponse};
use bazaar_core::{Product, ProductId};

use crate::error::{ApiJson, Result};
use crate::middleware::RequireAdmin;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// List every product. Public.
pub async fn index(State(state): State<AppState>) -> Result<Json<Arc<[Product]>>> {
    let products = CatalogService::new(state.db(), state.catalog_cache())
        .list()
        .await?;
    Ok(Json(products))
}

/// Add a product.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = CatalogService::new(state.db(), state.catalog_cache())
        .create(request)
        .await?;
    tracing::info!(product_id = %product.id, admin_id = %admin.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Remove a product.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<DeleteResponse>> {
    let Path(id) = id?;
    CatalogService::new(state.db(), state.catalog_cache())
        .delete(id)
        .await?;
    tracing::info!(product_id = %id, admin_id = %admin.id, "Product deleted");

    Ok(Json(DeleteResponse { success: true }))
}
