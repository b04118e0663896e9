//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. Errors render as
//! `{"message": ..., "field"?: ...}`. Server-side failures are captured to
//! Sentry and logged before responding, and their details never reach the
//! client.

use axum::{
    Json,
    extract::{
        FromRequest, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use thiserror::Error;

use bazaar_core::api::{ErrorBody, FieldError};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::messages::MessageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Messaging operation failed.
    #[error("Message error: {0}")]
    Messages(#[from] MessageError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Request body or parameter is invalid.
    #[error("Validation error: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    /// User is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// User is authenticated but not an admin.
    #[error("Must be admin")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        Self::Validation {
            field: Some(err.field.to_owned()),
            message: err.message,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation {
            field: None,
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation {
            field: None,
            message: rejection.body_text(),
        }
    }
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// Status code, client-facing message and offending field.
    fn parts(&self) -> (StatusCode, String, Option<String>) {
        let internal = || {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
                None,
            )
        };
        let invalid = |field: &str, message: String| {
            (StatusCode::BAD_REQUEST, message, Some(field.to_string()))
        };

        match self {
            Self::Database(_) | Self::Session(_) => internal(),
            Self::Auth(err) => match err {
                AuthError::InvalidUsername(e) => invalid("username", e.to_string()),
                AuthError::WeakPassword(msg) => invalid("password", msg.clone()),
                AuthError::UsernameTaken => {
                    invalid("username", "Username already exists".to_string())
                }
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid username or password".to_string(),
                    None,
                ),
                AuthError::UserNotFound => {
                    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None)
                }
                AuthError::Repository(_) | AuthError::PasswordHash => internal(),
            },
            Self::Catalog(err) => match err {
                CatalogError::Validation(e) => invalid(e.field, e.message.clone()),
                CatalogError::Repository(_) => internal(),
            },
            Self::Messages(err) => match err {
                MessageError::Validation(e) => invalid(e.field, e.message.clone()),
                MessageError::Repository(_) => internal(),
            },
            Self::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, message.clone(), field.clone())
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            // Non-admins get 401, not 403
            Self::Forbidden => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found"), None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, field) = self.parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(ErrorBody { message, field })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body extractor whose rejections render as validation errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
