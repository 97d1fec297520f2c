//! Message-turn orchestrator.
//!
//! One user turn is strictly sequential: fetch + authorize, compose the
//! prompt, invoke the model, validate its reply, then persist both messages.
//! Nothing is written until validation succeeds, so a failed turn leaves no
//! partial state. Concurrent turns on the same conversation are not
//! serialized; their relative append order is whatever the database sees.

use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use lingua_core::conversations::{self, MessageRow};
use lingua_core::llm::{LanguageModel, TurnReply};
use lingua_core::prompt::{Persona, compose_system_prompt};

/// Run one message turn, returning the persisted (user, assistant) pair.
#[instrument(skip_all, fields(conversation_id = %conversation_id, user_id = %user_id))]
pub async fn send_message(
    pool: &PgPool,
    model: &dyn LanguageModel,
    persona: Persona,
    user_id: &Uuid,
    conversation_id: &Uuid,
    content: &str,
) -> AppResult<(MessageRow, MessageRow)> {
    let conversation = conversations::get_conversation(pool, conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".into()))?;

    // Ownership is checked before the model is invoked, so non-owners can
    // never consume model quota.
    if conversation.user_id != *user_id {
        return Err(AppError::Unauthorized("Unauthorized".into()));
    }

    let system_prompt = compose_system_prompt(
        &conversation.native_language,
        &conversation.target_language,
        persona,
    );

    let raw = model.complete(&system_prompt, content).await?;
    debug!(bytes = raw.len(), "model reply received");

    let reply = TurnReply::parse(&raw)?;

    let (user_message, assistant_message) = conversations::create_turn(
        pool,
        conversation_id,
        content,
        &reply.user_target,
        &reply.ai_native,
        &reply.assistant_target_content(),
    )
    .await?;

    Ok((user_message, assistant_message))
}
