//! HTTP parameter pollution: a repeated query key keeps only its last value
//! unless the field may legitimately repeat.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use natours_infra::query::QueryParams;

use crate::app::dto::Params;

/// Fields that may appear more than once, meaning "any of".
pub const WHITELIST: &[&str] = &[
    "duration",
    "ratingsQuantity",
    "ratingsAverage",
    "maxGroupSize",
    "difficulty",
    "price",
];

fn field(key: &str) -> &str {
    key.split_once('[').map_or(key, |(field, _)| field)
}

pub fn dedupe(params: QueryParams) -> QueryParams {
    let keep: Vec<bool> = params
        .iter()
        .enumerate()
        .map(|(i, (key, _))| {
            WHITELIST.contains(&field(key)) || !params[i + 1..].iter().any(|(later, _)| later == key)
        })
        .collect();
    params
        .into_iter()
        .zip(keep)
        .filter_map(|(pair, keep)| keep.then_some(pair))
        .collect()
}

pub async fn prevent_pollution(mut req: Request, next: Next) -> Response {
    let params = req.extensions_mut().remove::<Params>().unwrap_or_default();
    req.extensions_mut().insert(Params(dedupe(params.0)));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> QueryParams {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn repeated_keys_keep_the_last_value() {
        let params = pairs(&[("sort", "price"), ("limit", "5"), ("sort", "duration")]);
        assert_eq!(dedupe(params), pairs(&[("limit", "5"), ("sort", "duration")]));
    }

    #[test]
    fn whitelisted_fields_may_repeat() {
        let params = pairs(&[("duration", "5"), ("duration", "9"), ("price[lt]", "1000")]);
        assert_eq!(dedupe(params.clone()), params);
    }
}
