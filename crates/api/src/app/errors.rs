//! Request errors and the single place they become HTTP responses.
//!
//! Handlers return [`AppError`]; its `IntoResponse` only sets the status and
//! stashes the error in the response extensions. The body is written by
//! [`crate::middleware::errors::format_errors`], which knows whether the
//! request came from the API or from a rendered page and which environment
//! the server runs in.

use axum::extract::OriginalUri;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

use natours_auth::{AuthzError, PasswordError, TokenError};
use natours_core::DomainError;
use natours_infra::email::MailError;
use natours_infra::repositories::RepoError;
use natours_infra::store::StoreError;
use natours_tours::GeoError;

const NO_DOCUMENT: &str = "No document found with that ID";
const GENERIC_MESSAGE: &str = "Something went very wrong!";

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Failed document validation; the message lists every failed field.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid id: {0}.")]
    InvalidId(String),

    #[error("Duplicate field value: {0}. Please use another value!")]
    Duplicate(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    TooManyRequests(String),

    /// A server-side failure whose message is safe to show, e.g. a failed email.
    #[error("{0}")]
    Unavailable(String),

    /// Anything unexpected. Never shown to clients in production.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found() -> Self {
        Self::NotFound(NO_DOCUMENT.to_string())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::InvalidId(_) | Self::Duplicate(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Operational errors are expected failures whose message clients may see.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// `fail` for client errors, `error` for server errors.
    pub fn status_text(&self) -> &'static str {
        if self.status().is_client_error() { "fail" } else { "error" }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::BadRequest(_) => "BadRequest",
            Self::InvalidId(_) => "CastError",
            Self::Duplicate(_) => "DuplicateKey",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "NotFound",
            Self::PayloadTooLarge(_) => "PayloadTooLarge",
            Self::TooManyRequests(_) => "TooManyRequests",
            Self::Unavailable(_) => "Unavailable",
            Self::Internal(_) => "Internal",
        }
    }

    /// Message a client may see in production.
    pub fn public_message(&self) -> String {
        if self.is_operational() {
            self.to_string()
        } else {
            GENERIC_MESSAGE.to_string()
        }
    }

    /// API body in development: full error detail.
    pub fn development_body(&self) -> JsonValue {
        json!({
            "status": self.status_text(),
            "error": {
                "statusCode": self.status().as_u16(),
                "status": self.status_text(),
                "kind": self.kind(),
                "isOperational": self.is_operational(),
            },
            "message": self.to_string(),
        })
    }

    /// API body in production: status and message only.
    pub fn production_body(&self) -> JsonValue {
        json!({
            "status": self.status_text(),
            "message": self.public_message(),
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut res = self.status().into_response();
        res.extensions_mut().insert(self);
        res
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(_) => Self::Validation(err.to_string()),
            DomainError::InvalidId(raw) => Self::InvalidId(raw),
            DomainError::NotFound => Self::not_found(),
            DomainError::Conflict(msg) => Self::BadRequest(msg),
            DomainError::Unauthorized => Self::Unauthorized("Unauthorized".to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { value, .. } => Self::Duplicate(value),
            StoreError::NotFound => Self::not_found(),
            other => Self::internal(other),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(err) => err.into(),
            RepoError::Store(err) => err.into(),
            RepoError::Password(err) => Self::internal(err),
            RepoError::Encoding(err) => Self::internal(err),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        Self::internal(err)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) => Self::internal(err),
            TokenError::Invalid | TokenError::Expired => Self::Unauthorized(err.to_string()),
        }
    }
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        Self::Forbidden(err.to_string())
    }
}

impl From<GeoError> for AppError {
    fn from(err: GeoError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        Self::internal(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

/// Fallback for every unmatched route.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    let url = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    AppError::NotFound(format!("Can't find {url} on this server!"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_message_names_the_value() {
        let err: AppError = StoreError::Duplicate {
            field: "name".to_string(),
            value: "The Forest Hiker".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Duplicate field value: The Forest Hiker. Please use another value!"
        );
    }

    #[test]
    fn malformed_id_becomes_a_400() {
        let err: AppError = DomainError::invalid_id("abc").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid id: abc.");
    }

    #[test]
    fn token_errors_are_401_with_their_message() {
        let err: AppError = TokenError::Expired.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Your token has expired! Please log in again.");
    }

    #[test]
    fn internal_errors_are_hidden_in_production() {
        let err = AppError::internal("connection reset");
        assert!(!err.is_operational());
        assert_eq!(err.status_text(), "error");
        assert_eq!(
            err.production_body(),
            json!({ "status": "error", "message": "Something went very wrong!" })
        );
        assert_eq!(err.development_body()["message"], "connection reset");
    }

    #[test]
    fn client_errors_are_fail() {
        let err = AppError::Forbidden("no".to_string());
        assert_eq!(err.status_text(), "fail");
        assert_eq!(err.production_body()["message"], "no");
    }

    #[test]
    fn into_response_stashes_the_error() {
        let res = AppError::not_found().into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.extensions().get::<AppError>().is_some());
    }
}
