//! REST API contract.
//!
//! Paths, request bodies and response envelopes shared by the storefront
//! server and the client. Requests arrive as loosely-typed bodies and are
//! turned into validated inputs with `validate()`, which reports the first
//! failing field.

use core::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::{NonEmptyText, Price, UserId};

/// Route paths.
pub mod paths {
    use crate::types::ProductId;

    pub const LOGIN: &str = "/api/login";
    pub const REGISTER: &str = "/api/register";
    pub const LOGOUT: &str = "/api/logout";
    pub const ME: &str = "/api/me";
    pub const PRODUCTS: &str = "/api/products";
    pub const MESSAGES: &str = "/api/messages";

    /// Path of a single product.
    #[must_use]
    pub fn product(id: ProductId) -> String {
        format!("{PRODUCTS}/{id}")
    }
}

/// A validation failure tied to one request field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// camelCase name of the offending field, as it appears in the JSON body.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /api/login` and `POST /api/register`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
}

/// A product that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: NonEmptyText,
    pub description: String,
    pub price: Price,
    pub image_url: Option<Url>,
    pub external_link: Option<Url>,
}

impl CreateProductRequest {
    /// Validate the request, checking fields in declaration order.
    ///
    /// Empty link fields are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns the first [`FieldError`] encountered.
    pub fn validate(self) -> Result<NewProduct, FieldError> {
        let name = NonEmptyText::parse(&self.name).map_err(|e| FieldError::new("name", e.to_string()))?;
        let price = Price::new(self.price).map_err(|e| FieldError::new("price", e.to_string()))?;
        let image_url = parse_link("imageUrl", self.image_url.as_deref())?;
        let external_link = parse_link("externalLink", self.external_link.as_deref())?;

        Ok(NewProduct {
            name,
            description: self.description,
            price,
            image_url,
            external_link,
        })
    }
}

/// Body of `POST /api/messages`.
///
/// A missing or null `receiverId` addresses the general shop inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub receiver_id: Option<UserId>,
    pub content: String,
}

/// A message that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub receiver_id: Option<UserId>,
    pub content: NonEmptyText,
}

impl SendMessageRequest {
    /// Validate the request.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] for `content` if it is blank.
    pub fn validate(self) -> Result<NewMessage, FieldError> {
        let content =
            NonEmptyText::parse(&self.content).map_err(|e| FieldError::new("content", e.to_string()))?;
        Ok(NewMessage {
            receiver_id: self.receiver_id,
            content,
        })
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Error envelope returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Response of `DELETE /api/products/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Plain acknowledgement, e.g. for logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub message: String,
}

fn parse_link(field: &'static str, raw: Option<&str>) -> Result<Option<Url>, FieldError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let url = Url::parse(raw).map_err(|e| FieldError::new(field, format!("invalid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FieldError::new(field, "must be an http or https URL"));
    }
    Ok(Some(url))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Giày Sneaker".to_string(),
            description: "Unisex".to_string(),
            price: 250_000,
            image_url: Some(String::new()),
            external_link: Some("https://taobao.com".to_string()),
        }
    }

    #[test]
    fn test_valid_product() {
        let product = product_request().validate().unwrap();
        assert_eq!(product.name.as_str(), "Giày Sneaker");
        assert_eq!(product.price.minor_units(), 250_000);
        assert!(product.image_url.is_none(), "empty link means absent");
        assert!(product.external_link.is_some());
    }

    #[test]
    fn test_first_failing_field_is_reported() {
        let request = CreateProductRequest {
            name: "  ".to_string(),
            price: -1,
            ..product_request()
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn test_negative_price() {
        let request = CreateProductRequest {
            price: -1,
            ..product_request()
        };
        assert_eq!(request.validate().unwrap_err().field, "price");
    }

    #[test]
    fn test_non_http_link_rejected() {
        let request = CreateProductRequest {
            image_url: Some("ftp://files.example/shoe.png".to_string()),
            ..product_request()
        };
        assert_eq!(request.validate().unwrap_err().field, "imageUrl");

        let request = CreateProductRequest {
            external_link: Some("not a url".to_string()),
            ..product_request()
        };
        assert_eq!(request.validate().unwrap_err().field, "externalLink");
    }

    #[test]
    fn test_send_message_defaults_to_general_inbox() {
        let request: SendMessageRequest = serde_json::from_str(r#"{"content":"hello"}"#).unwrap();
        let message = request.validate().unwrap();
        assert_eq!(message.receiver_id, None);
        assert_eq!(message.content.as_str(), "hello");
    }

    #[test]
    fn test_blank_message_rejected() {
        let request = SendMessageRequest {
            receiver_id: Some(UserId::new(2)),
            content: "   ".to_string(),
        };
        assert_eq!(request.validate().unwrap_err().field, "content");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials {
            username: "buyer".to_string(),
            password: "hunter22".to_string(),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("buyer"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_error_body_omits_missing_field() {
        let body = ErrorBody {
            message: "Unauthorized".to_string(),
            field: None,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"message":"Unauthorized"}"#
        );
    }

    #[test]
    fn test_product_path() {
        use crate::types::ProductId;
        assert_eq!(paths::product(ProductId::new(4)), "/api/products/4");
    }
}
