//! Messaging route handlers.

use axum::{Json, extract::State, http::StatusCode};

use bazaar_core::Message;
use bazaar_core::api::SendMessageRequest;

use crate::error::{ApiJson, Result};
use crate::middleware::RequireAuth;
use crate::services::messages::MessageService;
use crate::state::AppState;

/// Messages the caller may read, oldest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Message>>> {
    let messages = MessageService::new(state.db()).list_visible(&user).await?;
    Ok(Json(messages))
}

/// Send a message. A missing `receiverId` addresses the general inbox.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    let message = MessageService::new(state.db()).send(&user, request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
