//! Client error types.

use thiserror::Error;

/// Errors returned by [`ApiClient`](crate::ApiClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The base URL or a path could not be joined into a request URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// No session, or the session's user is not allowed to do this.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The server rejected the request body.
    #[error("Invalid {}: {message}", field.as_deref().unwrap_or("request"))]
    Validation {
        field: Option<String>,
        message: String,
    },

    /// The resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the server answered 401.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_field() {
        let err = ClientError::Validation {
            field: Some("price".to_string()),
            message: "price cannot be negative".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid price: price cannot be negative");

        let err = ClientError::Validation {
            field: None,
            message: "expected JSON".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid request: expected JSON");
    }
}
