//! Conversation and message persistence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::uuid::uuidv7;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Stored form of the role (matches the `messages.role` CHECK constraint).
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Row returned by conversation queries.
///
/// Serializes in camelCase, matching the wire format of the API.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub native_language: String,
    pub target_language: String,
    pub created_at: DateTime<Utc>,
}

/// Row returned by message queries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub native_content: String,
    pub target_content: String,
    pub created_at: DateTime<Utc>,
}

/// List a user's conversations, newest first.
pub async fn list_conversations(
    pool: &PgPool,
    user_id: &Uuid,
) -> Result<Vec<ConversationRow>, sqlx::Error> {
    sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT id, user_id, title, native_language, target_language, created_at
        FROM conversations
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Create a new conversation.
pub async fn create_conversation(
    pool: &PgPool,
    user_id: &Uuid,
    title: &str,
    native_language: &str,
    target_language: &str,
) -> Result<ConversationRow, sqlx::Error> {
    sqlx::query_as::<_, ConversationRow>(
        r#"
        INSERT INTO conversations (id, user_id, title, native_language, target_language)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, title, native_language, target_language, created_at
        "#,
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(title)
    .bind(native_language)
    .bind(target_language)
    .fetch_one(pool)
    .await
}

/// Get a conversation by ID.
///
/// Deliberately not scoped to a user: callers distinguish Not-Found from
/// not-owned, so the ownership check happens against the returned row.
pub async fn get_conversation(
    pool: &PgPool,
    conversation_id: &Uuid,
) -> Result<Option<ConversationRow>, sqlx::Error> {
    sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT id, user_id, title, native_language, target_language, created_at
        FROM conversations
        WHERE id = $1
        "#,
    )
    .bind(conversation_id)
    .fetch_optional(pool)
    .await
}

/// Delete a conversation and all of its messages.
///
/// The message cascade is enforced here, not by the schema: messages are
/// removed first, in the same transaction as the conversation row.
pub async fn delete_conversation(
    pool: &PgPool,
    conversation_id: &Uuid,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

/// Get messages for a conversation, in creation order.
pub async fn get_messages(
    pool: &PgPool,
    conversation_id: &Uuid,
) -> Result<Vec<MessageRow>, sqlx::Error> {
    sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, conversation_id, role, native_content, target_content, created_at
        FROM messages
        WHERE conversation_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await
}

/// Insert one message row inside an open transaction.
async fn insert_message(
    tx: &mut sqlx::PgTransaction<'_>,
    conversation_id: &Uuid,
    role: MessageRole,
    native_content: &str,
    target_content: &str,
) -> Result<MessageRow, sqlx::Error> {
    sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO messages (id, conversation_id, role, native_content, target_content)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, conversation_id, role, native_content, target_content, created_at
        "#,
    )
    .bind(uuidv7())
    .bind(conversation_id)
    .bind(role.as_str())
    .bind(native_content)
    .bind(target_content)
    .fetch_one(&mut **tx)
    .await
}

/// Persist one full turn: the user message followed by the assistant
/// message, atomically. Messages only ever exist in such pairs.
pub async fn create_turn(
    pool: &PgPool,
    conversation_id: &Uuid,
    user_native: &str,
    user_target: &str,
    assistant_native: &str,
    assistant_target: &str,
) -> Result<(MessageRow, MessageRow), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user_message = insert_message(
        &mut tx,
        conversation_id,
        MessageRole::User,
        user_native,
        user_target,
    )
    .await?;

    let assistant_message = insert_message(
        &mut tx,
        conversation_id,
        MessageRole::Assistant,
        assistant_native,
        assistant_target,
    )
    .await?;

    tx.commit().await?;
    Ok((user_message, assistant_message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_stored_form() {
        assert_eq!(MessageRole::User.as_str(), "user");
        assert_eq!(MessageRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn conversation_row_serializes_camel_case() {
        let row = ConversationRow {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            title: "Trip to Madrid".into(),
            native_language: "English".into(),
            target_language: "Spanish".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["nativeLanguage"], "English");
        assert_eq!(json["targetLanguage"], "Spanish");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("native_language").is_none());
    }

    #[test]
    fn message_row_serializes_camel_case() {
        let row = MessageRow {
            id: Uuid::nil(),
            conversation_id: Uuid::nil(),
            role: "user".into(),
            native_content: "Hi".into(),
            target_content: "Hola".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["conversationId"], Uuid::nil().to_string());
        assert_eq!(json["nativeContent"], "Hi");
        assert_eq!(json["targetContent"], "Hola");
    }
}
