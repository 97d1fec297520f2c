//! Language-model invocation.
//!
//! The orchestrator only sees the narrow [`LanguageModel`] trait: one
//! instruction, one user string, one raw reply. Transport, provider and
//! timeout failures all collapse into [`LlmError`] — there is no retry,
//! backoff or circuit breaking; a failed call fails the whole turn.

pub mod openai;
pub mod reply;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiChatModel;
pub use reply::{ReplyError, TurnReply};

/// Errors from the external model call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to language model failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("language model returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("language model returned no choices")]
    EmptyResponse,
}

/// A black-box language model: given a system instruction and the raw user
/// text, returns the raw text of the model's reply or fails.
///
/// The production implementation is [`OpenAiChatModel`]; tests substitute
/// a scripted fake.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String, LlmError>;
}
