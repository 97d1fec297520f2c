//! Authentication service — register/login flows delegating to
//! `lingua_core::auth`.

use sqlx::PgPool;
use tracing::info;

use crate::error::{AppError, AppResult};
use lingua_core::auth::jwt::generate_session_token;
use lingua_core::auth::{password, queries};
use lingua_core::models::auth::User;

/// A signed-in user plus the session token to place in the cookie.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Authenticate with email + password.
pub async fn login(
    pool: &PgPool,
    email: &str,
    password: &str,
    jwt_secret: &[u8],
) -> AppResult<Session> {
    let row = queries::find_user_by_email(pool, email).await?;

    // Generic error for both unknown email and wrong password.
    let (user_id, name, pw_hash) = match row {
        None => return Err(AppError::Unauthorized("Invalid credentials".into())),
        Some(r) => r,
    };

    if !password::verify_password(password, &pw_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = generate_session_token(&user_id.to_string(), email, jwt_secret)?;
    Ok(Session {
        user: User {
            id: user_id,
            email: email.to_string(),
            name,
        },
        token,
    })
}

/// Register a new user account and sign them in.
pub async fn register(
    pool: &PgPool,
    email: &str,
    password_plain: &str,
    name: Option<&str>,
    jwt_secret: &[u8],
) -> AppResult<Session> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    if password_plain.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if queries::email_exists(pool, email).await? {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let pw_hash = password::hash_password(password_plain)?;
    let user_id = queries::create_user(pool, email, name, &pw_hash).await?;
    info!(email, "registered new user");

    let token = generate_session_token(&user_id.to_string(), email, jwt_secret)?;
    Ok(Session {
        user: User {
            id: user_id,
            email: email.to_string(),
            name: name.map(|n| n.to_string()),
        },
        token,
    })
}
