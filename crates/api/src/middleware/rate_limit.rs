//! Fixed-window request limiting per client IP for `/api` routes.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use crate::app::errors::AppError;

pub const LIMIT_MESSAGE: &str = "Too many request from this IP, Please try again in an hour!";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    clients: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Count one request from `ip` at `now`.
    pub fn check(&self, ip: IpAddr, now: Instant) -> Decision {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let window = self.window;
        clients.retain(|_, w| now.duration_since(w.started) < window);

        let entry = clients.entry(ip).or_insert(Window { started: now, hits: 0 });
        if entry.hits >= self.max {
            return Decision::Limited;
        }
        entry.hits += 1;
        Decision::Allowed {
            remaining: self.max - entry.hits,
        }
    }
}

fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn rate_limit(State(limiter): State<RateLimiter>, req: Request, next: Next) -> Result<Response, AppError> {
    if !req.uri().path().starts_with("/api") {
        return Ok(next.run(req).await);
    }

    let ip = client_ip(&req);
    match limiter.check(ip, Instant::now()) {
        Decision::Allowed { remaining } => {
            let mut res = next.run(req).await;
            let headers = res.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limiter.max()));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            Ok(res)
        }
        Decision::Limited => {
            tracing::warn!(%ip, "rate limit exceeded");
            Err(AppError::TooManyRequests(LIMIT_MESSAGE.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn allows_up_to_max_then_limits() {
        let limiter = RateLimiter::new(2, Duration::from_secs(3600));
        let now = Instant::now();
        assert_eq!(limiter.check(IP, now), Decision::Allowed { remaining: 1 });
        assert_eq!(limiter.check(IP, now), Decision::Allowed { remaining: 0 });
        assert_eq!(limiter.check(IP, now), Decision::Limited);
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert_eq!(limiter.check(IP, now), Decision::Allowed { remaining: 0 });
        assert_eq!(limiter.check(IP, now), Decision::Limited);
        let later = now + Duration::from_secs(61);
        assert_eq!(limiter.check(IP, later), Decision::Allowed { remaining: 0 });
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(limiter.check(IP, now), Decision::Allowed { remaining: 0 });
        assert_eq!(limiter.check(other, now), Decision::Allowed { remaining: 0 });
    }
}
