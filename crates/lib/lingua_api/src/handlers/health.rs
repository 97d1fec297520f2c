//! Health-check handler.

use axum::Json;
use axum::extract::State;

use crate::AppState;

/// `GET /api/health` — liveness plus a database connectivity probe.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_connected = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();

    Json(serde_json::json!({
        "status": "ok",
        "version": lingua_core::version(),
        "dbConnected": db_connected,
    }))
}
