//! Bearer/cookie authentication.

use std::sync::Arc;

use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use chrono::Utc;

use natours_auth::User;

use crate::app::errors::AppError;
use crate::app::services::AppServices;
use crate::context::Cookies;

pub const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";
const USER_GONE: &str = "The user belonging to this token does no longer exist.";
const PASSWORD_CHANGED: &str = "User recently changed password! Please log in again.";

/// Cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "jwt";

fn services(parts: &Parts) -> Result<Arc<AppServices>, AppError> {
    parts
        .extensions
        .get::<Arc<AppServices>>()
        .cloned()
        .ok_or_else(|| AppError::internal("application services are not installed"))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Header token first, then the `jwt` cookie.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(token) = extract_bearer(&parts.headers) {
        return Some(token.to_string());
    }
    parts
        .extensions
        .get::<Cookies>()
        .and_then(|c| c.get(TOKEN_COOKIE))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Resolve the request's user: valid token, existing active account, and no
/// password change after the token was issued.
pub async fn authenticate(parts: &Parts) -> Result<User, AppError> {
    let token = extract_token(parts).ok_or_else(|| AppError::Unauthorized(NOT_LOGGED_IN.to_string()))?;
    let services = services(parts)?;

    let claims = services.jwt.verify(&token, Utc::now())?;

    let user = services
        .users
        .find(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized(USER_GONE.to_string()))?;

    if user.changed_password_after(claims.iat) {
        return Err(AppError::Unauthorized(PASSWORD_CHANGED.to_string()));
    }

    tracing::debug!(user_id = %user.id, role = %user.role, "request authenticated");
    Ok(user)
}

/// Like [`authenticate`] but only from the cookie, and silent on failure.
pub async fn identify(parts: &Parts) -> Option<User> {
    let cookie_only = parts.extensions.get::<Cookies>()?.get(TOKEN_COOKIE)?;
    if cookie_only.is_empty() {
        return None;
    }
    let services = services(parts).ok()?;
    let claims = services.jwt.verify(cookie_only, Utc::now()).ok()?;
    let user = services.users.find(claims.sub).await.ok()??;
    (!user.changed_password_after(claims.iat)).then_some(user)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Some("abc.def"));
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);
    }
}
