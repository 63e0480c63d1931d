//! Renders [`AppError`]s stashed by handlers and inner middleware.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};

use natours_infra::Environment;

use crate::app::errors::AppError;
use crate::app::views;

const PAGE_FALLBACK: &str = "Please try again later.";

/// JSON for `/api` requests, an HTML page otherwise. Development shows full
/// detail; production hides non-operational errors.
pub async fn format_errors(State(environment): State<Environment>, req: Request, next: Next) -> Response {
    let is_api = req.uri().path().starts_with("/api");
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let res = next.run(req).await;
    let Some(err) = res.extensions().get::<AppError>().cloned() else {
        return res;
    };

    if err.is_operational() {
        tracing::debug!(%method, %path, status = err.status().as_u16(), error = %err, "request failed");
    } else {
        tracing::error!(%method, %path, error = %err, "ERROR");
    }

    let production = environment.is_production();
    let mut rendered = if is_api {
        let body = if production { err.production_body() } else { err.development_body() };
        Json(body).into_response()
    } else {
        let message = match (production, err.is_operational()) {
            (false, _) | (true, true) => err.to_string(),
            (true, false) => PAGE_FALLBACK.to_string(),
        };
        Html(views::error_page("Something went wrong!", &message)).into_response()
    };

    *rendered.status_mut() = err.status();
    for (name, value) in res.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}
