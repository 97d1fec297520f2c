//! Conversations request handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthenticatedUser;
use lingua_core::conversations::{self, ConversationRow, MessageRow};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub title: String,
    pub native_language: String,
    pub target_language: String,
}

#[derive(Debug, Serialize)]
pub struct ConversationWithMessages {
    pub conversation: ConversationRow,
    pub messages: Vec<MessageRow>,
}

/// `GET /api/conversations` — list the user's conversations, newest first.
pub async fn list_conversations_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<ConversationRow>>> {
    let rows = conversations::list_conversations(&state.pool, &user.user_id).await?;
    Ok(Json(rows))
}

/// `POST /api/conversations` — create a conversation for a language pair.
pub async fn create_conversation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    AppJson(body): AppJson<CreateConversationRequest>,
) -> AppResult<(StatusCode, Json<ConversationRow>)> {
    for (field, value) in [
        ("title", &body.title),
        ("nativeLanguage", &body.native_language),
        ("targetLanguage", &body.target_language),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
    }

    let row = conversations::create_conversation(
        &state.pool,
        &user.user_id,
        &body.title,
        &body.native_language,
        &body.target_language,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// Fetch a conversation and authorize the requesting user against it.
///
/// Not-Found and Unauthorized stay distinct: a missing row is 404, a row
/// owned by someone else is 401.
pub(crate) async fn fetch_owned_conversation(
    state: &AppState,
    user: &AuthenticatedUser,
    conversation_id: &Uuid,
) -> AppResult<ConversationRow> {
    let conversation = conversations::get_conversation(&state.pool, conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".into()))?;

    if conversation.user_id != user.user_id {
        return Err(AppError::Unauthorized("Unauthorized".into()));
    }
    Ok(conversation)
}

/// `GET /api/conversations/{id}` — a conversation plus its messages in
/// creation order.
pub async fn get_conversation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ConversationWithMessages>> {
    let conversation = fetch_owned_conversation(&state, &user, &id).await?;
    let messages = conversations::get_messages(&state.pool, &id).await?;
    Ok(Json(ConversationWithMessages {
        conversation,
        messages,
    }))
}

/// `DELETE /api/conversations/{id}` — delete a conversation and its messages.
pub async fn delete_conversation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    fetch_owned_conversation(&state, &user, &id).await?;
    conversations::delete_conversation(&state.pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
