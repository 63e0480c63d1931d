//! Per-request context: parsed cookies and the authenticated user.

use std::collections::HashMap;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use natours_auth::User;

use crate::app::errors::AppError;
use crate::middleware::auth;

/// Cookies sent with the request, parsed once by
/// [`crate::middleware::cookies::parse_cookies`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies(HashMap<String, String>);

impl Cookies {
    /// Parse a `Cookie` header value: `a=1; b=2`.
    pub fn parse(header: &str) -> Self {
        let map = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().trim_matches('"').to_string()))
            })
            .collect();
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn merge(&mut self, other: Cookies) {
        self.0.extend(other.0);
    }
}

/// The logged-in user of a protected route.
///
/// Extraction runs the full token check and rejects with a 401 when any step
/// fails.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }
        let user = auth::authenticate(parts).await?;
        parts.extensions.insert(CurrentUser(user.clone()));
        Ok(Self(user))
    }
}

/// The user behind a valid `jwt` cookie, if any. Never rejects; used by the
/// rendered pages.
#[derive(Debug, Clone, Default)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(auth::identify(parts).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cookie_pairs() {
        let cookies = Cookies::parse("jwt=abc.def.ghi; theme=dark;  broken; =x");
        assert_eq!(cookies.get("jwt"), Some("abc.def.ghi"));
        assert_eq!(cookies.get("theme"), Some("dark"));
        assert_eq!(cookies.get("broken"), None);
    }

    #[test]
    fn empty_header_has_no_cookies() {
        assert_eq!(Cookies::parse(""), Cookies::default());
    }
}
