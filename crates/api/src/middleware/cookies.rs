use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::context::Cookies;

/// Parse every `Cookie` header into a [`Cookies`] extension.
pub async fn parse_cookies(mut req: Request, next: Next) -> Response {
    let mut cookies = Cookies::default();
    for value in req.headers().get_all(header::COOKIE) {
        if let Ok(value) = value.to_str() {
            cookies.merge(Cookies::parse(value));
        }
    }
    req.extensions_mut().insert(cookies);
    next.run(req).await
}

/// `Set-Cookie` value for the session token.
pub fn token_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!("{}={token}; Max-Age={max_age_secs}; Path=/; HttpOnly", super::auth::TOKEN_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cookie_is_http_only_and_secure_on_request() {
        assert_eq!(token_cookie("abc", 60, false), "jwt=abc; Max-Age=60; Path=/; HttpOnly");
        assert!(token_cookie("abc", 60, true).ends_with("; HttpOnly; Secure"));
    }
}
