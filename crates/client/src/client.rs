//! HTTP client for the storefront REST API.

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use bazaar_core::api::{
    Acknowledgement, CreateProductRequest, Credentials, DeleteResponse, ErrorBody,
    SendMessageRequest, paths,
};
use bazaar_core::{Message, Product, ProductId, User, UserId};

use crate::error::ClientError;

/// Client for the Bazaar storefront API.
///
/// Holds its own cookie jar, so a successful [`login`](Self::login) or
/// [`register`](Self::register) authenticates every later call made through
/// this client or its clones.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)?;
        let client = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner { client, base_url }),
        })
    }

    /// The server this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Log in and keep the session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] on bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let body = Credentials {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        self.execute(self.post(paths::LOGIN)?.json(&body)).await
    }

    /// Create an account and log in as it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] when the username is taken or the
    /// credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let body = Credentials {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        self.execute(self.post(paths::REGISTER)?.json(&body)).await
    }

    /// End the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn logout(&self) -> Result<Acknowledgement, ClientError> {
        self.execute(self.post(paths::LOGOUT)?).await
    }

    /// The logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] without a session.
    pub async fn me(&self) -> Result<User, ClientError> {
        self.execute(self.get(paths::ME)?).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        self.execute(self.get(paths::PRODUCTS)?).await
    }

    /// Add a product. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] for non-admins and
    /// [`ClientError::Validation`] for invalid fields.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: &CreateProductRequest,
    ) -> Result<Product, ClientError> {
        self.execute(self.post(paths::PRODUCTS)?.json(request)).await
    }

    /// Remove a product. Admin only. Succeeds for an id that is already gone.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] for non-admins.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<DeleteResponse, ClientError> {
        let url = self.url(&paths::product(id))?;
        self.execute(self.inner.client.delete(url)).await
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Messages visible to the logged-in user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] without a session.
    pub async fn messages(&self) -> Result<Vec<Message>, ClientError> {
        self.execute(self.get(paths::MESSAGES)?).await
    }

    /// Send a message. `None` addresses the shop's general inbox.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for blank content or an unknown
    /// receiver.
    #[instrument(skip(self, content))]
    pub async fn send_message(
        &self,
        receiver_id: Option<UserId>,
        content: &str,
    ) -> Result<Message, ClientError> {
        let body = SendMessageRequest {
            receiver_id,
            content: content.to_owned(),
        };
        self.execute(self.post(paths::MESSAGES)?.json(&body)).await
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.inner.client.get(self.url(path)?))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.inner.client.post(self.url(path)?))
    }

    /// Send `request` and decode a successful JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = %status, body = %body, "API request failed");
            return Err(error_for_status(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Map a non-success response to a [`ClientError`].
fn error_for_status(status: StatusCode, body: &str) -> ClientError {
    let ErrorBody { message, field } =
        serde_json::from_str(body).unwrap_or_else(|_| ErrorBody {
            message: status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
            field: None,
        });

    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::BAD_REQUEST => ClientError::Validation { field, message },
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_keeps_message() {
        let err = error_for_status(StatusCode::UNAUTHORIZED, r#"{"message":"Must be admin"}"#);
        assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "Must be admin"));
    }

    #[test]
    fn test_validation_keeps_field() {
        let err = error_for_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Username already exists","field":"username"}"#,
        );
        match err {
            ClientError::Validation { field, message } => {
                assert_eq!(field.as_deref(), Some("username"));
                assert_eq!(message, "Username already exists");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_json_body_uses_reason_phrase() {
        let err = error_for_status(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn test_paths_join_onto_base() {
        let client = ApiClient::new("http://127.0.0.1:3000").unwrap();
        assert_eq!(
            client.url(&paths::product(ProductId::new(7))).unwrap().as_str(),
            "http://127.0.0.1:3000/api/products/7"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::Url(_))
        ));
    }
}
