//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/login          - Log in, binds the session
//! POST   /api/register       - Create a buyer account and log in
//! POST   /api/logout         - Destroy the session
//! GET    /api/me             - The logged-in user
//!
//! # Catalog
//! GET    /api/products       - Product listing (public)
//! POST   /api/products       - Add a product (admin)
//! DELETE /api/products/{id}  - Remove a product (admin)
//!
//! # Messages (requires auth)
//! GET    /api/messages       - Messages visible to the caller
//! POST   /api/messages       - Send a message
//! ```

pub mod auth;
pub mod messages;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, post},
};

use bazaar_core::api::paths;

use crate::state::AppState;

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(paths::LOGIN, post(auth::login))
        .route(paths::REGISTER, post(auth::register))
        .route(paths::LOGOUT, post(auth::logout))
        .route(paths::ME, get(auth::me))
        .route(paths::PRODUCTS, get(products::index).post(products::create))
        .route("/api/products/{id}", delete(products::destroy))
        .route(paths::MESSAGES, get(messages::index).post(messages::create))
}
