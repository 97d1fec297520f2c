//! Message request handler — the entry point of the turn orchestrator.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::chat;
use lingua_core::conversations::MessageRow;

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    /// The user's message, in their native language.
    pub content: String,
}

/// `POST /api/conversations/{id}/messages` — run one turn and return the
/// persisted `[userMessage, assistantMessage]` pair.
pub async fn create_message_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    AppJson(body): AppJson<CreateMessageRequest>,
) -> AppResult<(StatusCode, Json<[MessageRow; 2]>)> {
    if body.content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".into()));
    }

    let (user_message, assistant_message) = chat::send_message(
        &state.pool,
        state.llm.as_ref(),
        state.config.persona,
        &user.user_id,
        &id,
        &body.content,
    )
    .await?;

    Ok((StatusCode::CREATED, Json([user_message, assistant_message])))
}
