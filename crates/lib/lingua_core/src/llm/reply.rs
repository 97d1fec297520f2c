//! Reply contract of the turn prompt.
//!
//! The model is told to emit exactly one JSON object with three mandatory
//! fields and an optional transliteration. Beyond presence and non-emptiness
//! nothing is checked — field content is trusted from the model.

use serde::Deserialize;
use thiserror::Error;

/// Validation errors for a model reply.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("model reply is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("model reply missing field {0:?}")]
    MissingField(&'static str),
}

/// Parsed model reply for one turn.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    /// The user's message, translated into the target language.
    #[serde(default)]
    pub user_target: String,
    /// The assistant's reply, in the target language.
    #[serde(default)]
    pub ai_target: String,
    /// Romanization of the reply, present for non-Latin scripts.
    #[serde(default)]
    pub ai_transliteration: Option<String>,
    /// The assistant's reply, translated into the native language.
    #[serde(default)]
    pub ai_native: String,
}

impl TurnReply {
    /// Parse and validate the raw model output.
    pub fn parse(raw: &str) -> Result<Self, ReplyError> {
        let reply: TurnReply = serde_json::from_str(raw)?;

        if reply.user_target.trim().is_empty() {
            return Err(ReplyError::MissingField("userTarget"));
        }
        if reply.ai_target.trim().is_empty() {
            return Err(ReplyError::MissingField("aiTarget"));
        }
        if reply.ai_native.trim().is_empty() {
            return Err(ReplyError::MissingField("aiNative"));
        }

        Ok(reply)
    }

    /// Target-language content of the assistant message: the reply itself,
    /// with the transliteration appended as `"<reply>\n(<transliteration>)"`
    /// when the model supplied one.
    pub fn assistant_target_content(&self) -> String {
        match self.ai_transliteration.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => format!("{}\n({})", self.ai_target, t),
            _ => self.ai_target.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_valid_reply() {
        let reply = TurnReply::parse(
            r#"{"userTarget":"Hola","aiTarget":"¡Hola! ¿Qué tal?","aiNative":"Hi! How's it going?"}"#,
        )
        .unwrap();
        assert_eq!(reply.user_target, "Hola");
        assert_eq!(reply.ai_target, "¡Hola! ¿Qué tal?");
        assert_eq!(reply.ai_native, "Hi! How's it going?");
        assert!(reply.ai_transliteration.is_none());
        assert_eq!(reply.assistant_target_content(), "¡Hola! ¿Qué tal?");
    }

    #[test]
    fn transliteration_is_appended_in_parentheses() {
        let reply = TurnReply::parse(
            r#"{"userTarget":"Hola","aiTarget":"¡Hola! ¿Qué tal?","aiTransliteration":"Hola, ke tal","aiNative":"Hi! How's it going?"}"#,
        )
        .unwrap();
        assert_eq!(
            reply.assistant_target_content(),
            "¡Hola! ¿Qué tal?\n(Hola, ke tal)"
        );
    }

    #[test]
    fn blank_transliteration_is_ignored() {
        let reply = TurnReply::parse(
            r#"{"userTarget":"a","aiTarget":"b","aiTransliteration":"   ","aiNative":"c"}"#,
        )
        .unwrap();
        assert_eq!(reply.assistant_target_content(), "b");
    }

    #[test]
    fn missing_ai_target_is_rejected() {
        let err = TurnReply::parse(r#"{"userTarget":"Hola","aiNative":"Hi"}"#).unwrap_err();
        assert!(matches!(err, ReplyError::MissingField("aiTarget")));
    }

    #[test]
    fn empty_mandatory_field_is_rejected() {
        let err =
            TurnReply::parse(r#"{"userTarget":"","aiTarget":"b","aiNative":"c"}"#).unwrap_err();
        assert!(matches!(err, ReplyError::MissingField("userTarget")));
    }

    #[test]
    fn non_json_reply_is_rejected() {
        let err = TurnReply::parse("I'm sorry, I can't do that").unwrap_err();
        assert!(matches!(err, ReplyError::MalformedJson(_)));
    }
}
