//! Request extraction and response envelopes shared by the API routes.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, async_trait};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};

use natours_core::DomainError;
use natours_infra::query::{ApiFeatures, QueryParams};

use super::errors::AppError;

/// JSON body whose rejections go through [`AppError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => AppError::BadRequest(format!("Invalid input data. {}", err.body_text())),
        other => AppError::BadRequest(other.body_text()),
    }
}

/// Query pairs after sanitizing and parameter-pollution cleanup.
///
/// Inserted by [`crate::middleware::hpp`]; falls back to the raw query string
/// when the middleware did not run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(pub QueryParams);

impl Params {
    pub fn features(&self) -> ApiFeatures {
        ApiFeatures::from_params(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Params
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(params) = parts.extensions.get::<Params>() {
            return Ok(params.clone());
        }
        let pairs = axum::extract::Query::<QueryParams>::try_from_uri(&parts.uri)
            .map(|q| q.0)
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(pairs))
    }
}

/// Parse a path segment into a typed id.
pub fn parse_id<T>(raw: &str) -> Result<T, AppError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(AppError::from)
}

/// `{ status: "success", data: { data } }`
pub fn document<T: Serialize>(status: StatusCode, doc: T) -> Response {
    (
        status,
        Json(json!({
            "status": "success",
            "data": { "data": doc },
        })),
    )
        .into_response()
}

/// `{ status: "success", results, data: { data } }`
pub fn documents(docs: Vec<JsonValue>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "results": docs.len(),
            "data": { "data": docs },
        })),
    )
        .into_response()
}

/// `{ status: "success", data: { <key>: value } }`
pub fn named<T: Serialize>(key: &str, value: T) -> Response {
    let mut data = serde_json::Map::new();
    data.insert(key.to_string(), serde_json::to_value(value).unwrap_or(JsonValue::Null));
    (StatusCode::OK, Json(json!({ "status": "success", "data": data }))).into_response()
}

pub fn message(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "status": "success", "message": message }))).into_response()
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// `http(s)://host` the request was addressed to.
pub fn origin(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use natours_core::TourId;

    use super::*;

    #[test]
    fn parse_id_reports_the_raw_value() {
        let err = parse_id::<TourId>("nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid id: nope.");
    }

    #[test]
    fn origin_prefers_forwarded_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("natours.dev"));
        assert_eq!(origin(&headers), "http://natours.dev");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(origin(&headers), "https://natours.dev");
    }
}
