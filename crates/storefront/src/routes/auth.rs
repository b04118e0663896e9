//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::User;
use bazaar_core::api::{Acknowledgement, Credentials};

use crate::error::{ApiJson, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Log in with username and password.
#[instrument(skip_all, fields(username = %credentials.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.db())
        .login(&credentials.username, &credentials.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, user.username.as_str());
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(user))
}

/// Create a buyer account and log it in.
#[instrument(skip_all, fields(username = %credentials.username))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.db())
        .register(&credentials.username, &credentials.password)
        .await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, user.username.as_str());
    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Destroy the session. Succeeds whether or not anyone was logged in.
pub async fn logout(session: Session) -> Result<Json<Acknowledgement>> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(Json(Acknowledgement {
        message: "Logged out".to_string(),
    }))
}

/// The logged-in user.
pub async fn me(RequireAuth(user): RequireAuth) -> Json<User> {
    Json(user)
}
