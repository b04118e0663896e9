//! Bazaar Storefront library.
//!
//! The HTTP API server as a library, so the binary, the CLI and the
//! end-to-end tests share one implementation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use app::build_app;
pub use config::StorefrontConfig;
pub use db::Database;
pub use state::AppState;
