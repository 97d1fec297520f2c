//! API server configuration.

use lingua_core::auth::jwt::resolve_jwt_secret;
use lingua_core::prompt::Persona;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3200").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// JWT signing secret for session cookies.
    pub jwt_secret: String,
    /// API key for the language-model provider.
    pub openai_api_key: String,
    /// Base URL of the OpenAI-compatible endpoint, when overridden.
    pub openai_base_url: Option<String>,
    /// Chat model name, when overridden.
    pub chat_model: Option<String>,
    /// Assistant persona for the turn prompt.
    pub persona: Persona,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                      |
    /// |--------------------|----------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:3200`                             |
    /// | `DATABASE_URL`     | `postgres://localhost:5432/lingua`           |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file      |
    /// | `OPENAI_API_KEY`   | empty (message turns will fail upstream)     |
    /// | `OPENAI_BASE_URL`  | provider default                             |
    /// | `CHAT_MODEL`       | provider default                             |
    /// | `CHAT_PERSONA`     | `tutor`                                      |
    pub fn from_env() -> Self {
        let persona = std::env::var("CHAT_PERSONA")
            .ok()
            .and_then(|v| v.parse::<Persona>().ok())
            .unwrap_or_default();

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3200".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/lingua".into()),
            jwt_secret: resolve_jwt_secret(),
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            openai_base_url: std::env::var("OPENAI_BASE_URL").ok(),
            chat_model: std::env::var("CHAT_MODEL").ok(),
            persona,
        }
    }
}
