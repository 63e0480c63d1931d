//! Request pipeline, applied in this order: security headers, rate limiting,
//! body cap, cookies, sanitizing, parameter pollution cleanup. Error
//! formatting wraps all of it.

pub mod auth;
pub mod body;
pub mod cookies;
pub mod errors;
pub mod hpp;
pub mod rate_limit;
pub mod sanitize;
pub mod security;
