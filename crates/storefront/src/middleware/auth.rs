//! Authentication extractors and session helpers.
//!
//! The session stores only a [`CurrentUser`]. Guards re-read the account from
//! storage on every request, so a deleted account or a revoked admin flag
//! takes effect immediately.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use bazaar_core::User;

use crate::error::AppError;
use crate::models::CurrentUser;
use crate::models::session::keys;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a logged-in user.
///
/// Rejects with 401 when there is no session or the account is gone.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireAuth(user): RequireAuth) -> Json<User> {
///     Json(user)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AppError::Unauthorized)?;

        let current: CurrentUser = session
            .get(keys::CURRENT_USER)
            .await?
            .ok_or(AppError::Unauthorized)?;

        match AuthService::new(state.db()).get_user(current.id).await {
            Ok(user) => Ok(Self(user)),
            Err(AuthError::UserNotFound) => {
                tracing::debug!(user_id = %current.id, "Session refers to a missing user");
                Err(AppError::Unauthorized)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Extractor that requires a logged-in admin.
///
/// Anonymous requests and non-admins are both rejected with 401; the message
/// tells them apart.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Bind the session to `user`, rotating the session ID first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(keys::CURRENT_USER, CurrentUser::from(user))
        .await
}

/// Destroy the session (logout).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
