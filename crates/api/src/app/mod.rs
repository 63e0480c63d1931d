pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Extension;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::{body, cookies, errors as error_format, hpp, rate_limit, sanitize, security};
use services::AppServices;

/// Build the full application router.
///
/// Requests pass security headers, rate limiting, the body cap, cookie
/// parsing, sanitizing and parameter pollution cleanup before routing; errors
/// from any of those steps or from a handler are rendered on the way out.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let environment = services.config.environment;
    let limiter = rate_limit::RateLimiter::new(
        services.config.rate_limit_max,
        Duration::from_secs(services.config.rate_limit_window_secs),
    );

    let api = Router::new()
        .nest("/tours", routes::tours::router())
        .nest("/users", routes::users::router())
        .nest("/reviews", routes::reviews::router())
        .nest("/bookings", routes::bookings::router());

    let app = Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::views::router())
        .nest("/api/v1", api)
        .fallback(errors::not_found)
        .layer(from_fn(hpp::prevent_pollution))
        .layer(from_fn(sanitize::sanitize))
        .layer(from_fn(cookies::parse_cookies))
        .layer(from_fn(body::limit_body))
        .layer(from_fn_with_state(limiter, rate_limit::rate_limit));

    security::with_security_headers(app).layer(
        ServiceBuilder::new()
            .layer(Extension(services))
            .layer(TraceLayer::new_for_http())
            .layer(from_fn_with_state(environment, error_format::format_errors)),
    )
}
