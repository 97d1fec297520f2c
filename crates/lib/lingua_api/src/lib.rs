//! # lingua_api
//!
//! HTTP API library for LinguaChat.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, conversations, health, messages};
use lingua_core::llm::LanguageModel;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// The language model behind the message turn.
    pub llm: Arc<dyn LanguageModel>,
}

/// Run embedded database migrations.
///
/// Delegates to `lingua_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    lingua_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler));

    // Protected routes (require a session)
    let protected = Router::new()
        .route("/api/auth/user", get(auth::current_user_handler))
        .route(
            "/api/conversations",
            get(conversations::list_conversations_handler)
                .post(conversations::create_conversation_handler),
        )
        .route(
            "/api/conversations/{id}",
            get(conversations::get_conversation_handler)
                .delete(conversations::delete_conversation_handler),
        )
        .route(
            "/api/conversations/{id}/messages",
            post(messages::create_message_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
