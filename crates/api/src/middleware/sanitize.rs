//! Strips query-operator keys and HTML from untrusted input.

use axum::body::Body;
use axum::extract::{Query, Request};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value as JsonValue;

use natours_infra::query::QueryParams;

use crate::app::dto::Params;
use crate::app::errors::AppError;

/// Keys a document store could read as an operator or a path.
fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

fn clean_html(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Drop operator keys at every depth and neutralize markup in strings.
pub fn sanitize_value(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .filter(|(key, _)| !is_operator_key(key))
                .map(|(key, value)| (key, sanitize_value(value)))
                .collect(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(sanitize_value).collect()),
        JsonValue::String(text) => JsonValue::String(clean_html(&text)),
        other => other,
    }
}

pub fn sanitize_params(params: QueryParams) -> QueryParams {
    params
        .into_iter()
        .filter(|(key, _)| !is_operator_key(key))
        .map(|(key, value)| (key, clean_html(&value)))
        .collect()
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Sanitize the JSON body and the query string. Bodies that are not valid JSON
/// pass through untouched for the extractor to reject.
pub async fn sanitize(mut req: Request, next: Next) -> Result<Response, AppError> {
    let params = Query::<QueryParams>::try_from_uri(req.uri())
        .map(|q| q.0)
        .unwrap_or_default();
    req.extensions_mut().insert(Params(sanitize_params(params)));

    if !is_json(&req) {
        return Ok(next.run(req).await);
    }

    let (mut parts, body) = req.into_parts();
    // Already capped by the body limit.
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(AppError::internal)?;

    let body = match serde_json::from_slice::<JsonValue>(&bytes) {
        Ok(value) => {
            let cleaned = serde_json::to_vec(&sanitize_value(value))?;
            parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(cleaned.len()));
            Body::from(cleaned)
        }
        Err(_) => Body::from(bytes),
    };

    Ok(next.run(Request::from_parts(parts, body)).await)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn operator_keys_are_dropped_at_every_depth() {
        let input = json!({
            "email": { "$gt": "" },
            "password": "pass1234",
            "nested": [{ "a.b": 1, "ok": 2 }]
        });
        assert_eq!(
            sanitize_value(input),
            json!({ "email": {}, "password": "pass1234", "nested": [{ "ok": 2 }] })
        );
    }

    #[test]
    fn markup_is_escaped() {
        let input = json!({ "name": "<script>alert('x')</script>" });
        assert_eq!(
            sanitize_value(input),
            json!({ "name": "&lt;script&gt;alert('x')&lt;/script&gt;" })
        );
    }

    #[test]
    fn query_operator_keys_are_dropped() {
        let params = vec![
            ("$where".to_string(), "1".to_string()),
            ("price[gte]".to_string(), "500".to_string()),
            ("name".to_string(), "<b>".to_string()),
        ];
        assert_eq!(
            sanitize_params(params),
            vec![
                ("price[gte]".to_string(), "500".to_string()),
                ("name".to_string(), "&lt;b&gt;".to_string()),
            ]
        );
    }
}
