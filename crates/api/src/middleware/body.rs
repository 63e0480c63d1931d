use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::app::errors::AppError;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 10 * 1024;

/// Buffer the body, rejecting anything over [`BODY_LIMIT`] with a 413.
pub async fn limit_body(req: Request, next: Next) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|_| AppError::PayloadTooLarge("Request body is larger than 10kb.".to_string()))?;
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
