//! Cookie service — set/clear the httpOnly session cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use lingua_core::auth::jwt::SESSION_EXPIRY_SECS;
use time::Duration;

/// Cookie name for the session token.
pub const SESSION_COOKIE: &str = "lingua_session";

/// Build the httpOnly cookie carrying the session JWT.
pub fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(false) // TODO: set true once the deployment terminates TLS
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::seconds(SESSION_EXPIRY_SECS))
        .build()
}

/// Build an expired cookie to clear the session.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_lax() {
        let c = session_cookie("tok");
        assert_eq!(c.name(), SESSION_COOKIE);
        assert_eq!(c.value(), "tok");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.path(), Some("/"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let c = clear_session_cookie();
        assert_eq!(c.max_age(), Some(Duration::ZERO));
        assert!(c.value().is_empty());
    }
}
