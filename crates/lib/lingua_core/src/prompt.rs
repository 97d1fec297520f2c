//! System-prompt composition for the message turn.
//!
//! The instruction is a fixed template parameterized by the conversation's
//! language pair and the configured persona. Language names are used
//! verbatim — whatever the conversation stores is what the model sees.

use std::fmt;
use std::str::FromStr;

/// Assistant persona. A server-wide configuration choice, not user-selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persona {
    /// Instructive, encouraging tutor.
    #[default]
    Tutor,
    /// Casual conversation partner.
    Peer,
}

impl Persona {
    fn opening_line(self) -> &'static str {
        match self {
            Persona::Tutor => {
                "You are a friendly and encouraging language learning assistant."
            }
            Persona::Peer => {
                "You are a casual, laid-back conversation partner chatting with a friend."
            }
        }
    }

    fn reply_style(self) -> &'static str {
        match self {
            Persona::Tutor => "Use warm, encouraging language.",
            Persona::Peer => "Sound relaxed and informal, like everyday small talk.",
        }
    }
}

impl FromStr for Persona {
    type Err = UnknownPersona;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tutor" => Ok(Persona::Tutor),
            "peer" => Ok(Persona::Peer),
            other => Err(UnknownPersona(other.to_string())),
        }
    }
}

/// Error for unrecognized persona names.
#[derive(Debug, thiserror::Error)]
#[error("unknown persona: {0:?} (expected \"tutor\" or \"peer\")")]
pub struct UnknownPersona(String);

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persona::Tutor => write!(f, "tutor"),
            Persona::Peer => write!(f, "peer"),
        }
    }
}

/// Build the system instruction for one turn.
///
/// The model must answer with exactly one JSON object carrying
/// `userTarget`, `aiTarget`, `aiTransliteration` (optional) and `aiNative`;
/// anything else is rejected by the reply validator.
pub fn compose_system_prompt(
    native_language: &str,
    target_language: &str,
    persona: Persona,
) -> String {
    format!(
        r#"{opening}
The user speaks "{native}" (Native) and wants to learn "{target}" (Target).

Your task is to:
1. Translate the user's message to the Target language.
2. Generate a very short, natural, conversational response in the Target language.
   - Keep it to 1-2 short sentences maximum.
   - {style}
3. If the Target language is written in a non-Latin script, romanize your response.
4. Translate your response to the Native language.

Output JSON only:
{{
  "userTarget": "Translation of user message to target language",
  "aiTarget": "Your short response in target language",
  "aiTransliteration": "Romanization of your response (omit for Latin scripts)",
  "aiNative": "Translation of your response to native language"
}}"#,
        opening = persona.opening_line(),
        native = native_language,
        target = target_language,
        style = persona.reply_style(),
    )
}
