//! Authentication request handlers.

use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::auth;
use crate::services::cookies::{clear_session_cookie, session_cookie};
use lingua_core::models::auth::User;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/register` — create an account and set the session cookie.
pub async fn register_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(body): AppJson<RegisterRequest>,
) -> AppResult<(CookieJar, Json<User>)> {
    let session = auth::register(
        &state.pool,
        &body.email,
        &body.password,
        body.name.as_deref(),
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    Ok((
        jar.add(session_cookie(&session.token)),
        Json(session.user),
    ))
}

/// `POST /api/auth/login` — authenticate and set the session cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<User>)> {
    let session = auth::login(
        &state.pool,
        &body.email,
        &body.password,
        state.config.jwt_secret.as_bytes(),
    )
    .await?;
    Ok((
        jar.add(session_cookie(&session.token)),
        Json(session.user),
    ))
}

/// `POST /api/auth/logout` — clear the session cookie.
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    (
        jar.add(clear_session_cookie()),
        Json(serde_json::json!({ "success": true })),
    )
}

/// `GET /api/auth/user` — return the signed-in user.
pub async fn current_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<User>> {
    let user = lingua_core::auth::queries::get_user_by_id(&state.pool, &user.user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))?;
    Ok(Json(user))
}
