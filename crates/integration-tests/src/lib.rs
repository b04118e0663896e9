//! End-to-end test harness for Bazaar.
//!
//! Each [`TestContext`] runs the full storefront router on an ephemeral
//! localhost port against a fresh memory database, so tests need no running
//! services and never share state.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Registration, login, logout and the session guard
//! - `products` - Catalog listing, admin writes and seeding
//! - `messages` - Sending, visibility and conversation grouping
//! - `sync` - The polling message feed against a live server

use bazaar_client::ApiClient;
use bazaar_core::User;
use bazaar_storefront::db::Database;
use bazaar_storefront::services::auth::AuthService;
use bazaar_storefront::{AppState, StorefrontConfig, build_app};
use tokio::task::JoinHandle;

/// Username of the admin account every context starts with.
pub const ADMIN_USERNAME: &str = "owner";
/// Password of the admin account every context starts with.
pub const ADMIN_PASSWORD: &str = "Kh0-Hang!9x";
/// Password used for buyer accounts created by [`TestContext::buyer`].
pub const BUYER_PASSWORD: &str = "mua-sam-123";

/// A running storefront with its own memory database.
pub struct TestContext {
    pub base_url: String,
    pub db: Database,
    pub admin: User,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Start a server with an empty catalog and one admin account.
    pub async fn spawn() -> Self {
        let db = Database::memory();
        let admin = AuthService::new(&db)
            .create_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .expect("Failed to create admin");

        let app = build_app(AppState::new(StorefrontConfig::in_memory(), db.clone()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            db,
            admin,
            server,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A raw HTTP client with its own cookie jar.
    #[must_use]
    pub fn http(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// A typed API client that is not logged in.
    #[must_use]
    pub fn anonymous(&self) -> ApiClient {
        ApiClient::new(&self.base_url).expect("Failed to create API client")
    }

    /// A typed API client logged in as the admin.
    pub async fn admin_client(&self) -> ApiClient {
        let client = self.anonymous();
        client
            .login(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .expect("Admin login failed");
        client
    }

    /// Register a buyer and return a client logged in as them.
    pub async fn buyer(&self, username: &str) -> (ApiClient, User) {
        let client = self.anonymous();
        let user = client
            .register(username, BUYER_PASSWORD)
            .await
            .expect("Buyer registration failed");
        (client, user)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}
