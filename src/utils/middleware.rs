use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;
use dashmap::DashMap;
use tracing::warn;
use uuid::Uuid;

/// Fixed-window per-key request counter.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_window: u64,
    window: Duration,
    entries: DashMap<String, (u64, Instant)>,
}

impl RateLimiter {
    pub fn new(requests_per_window: u64, window_secs: u64) -> Self {
        Self {
            requests_per_window,
            window: Duration::from_secs(window_secs),
            entries: DashMap::new(),
        }
    }

    pub fn check_rate_limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert((0, now));

        if now.duration_since(entry.1) >= self.window {
            *entry = (1, now);
            return true;
        }
        if entry.0 >= self.requests_per_window {
            return false;
        }
        entry.0 += 1;
        true
    }
}

/// Per-IP rate limiting. Health checks and session creation are exempt,
/// mirroring the public chat surface's expectations.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, StatusCode> {
    let path = request.uri().path();
    if path == "/health" || path.starts_with("/api/chat/session") {
        return Ok(next.run(request).await);
    }

    let key = request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !limiter.check_rate_limit(&key) {
        warn!(action = "rate_limited", ip = %key, path = %path);
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(request).await)
}

/// Attach a request id and a tracing span to every request.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(request_id.clone());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri()
    );
    let _enter = span.enter();
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_blocks_after_budget() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.check_rate_limit("1.2.3.4"));
        assert!(limiter.check_rate_limit("1.2.3.4"));
        assert!(!limiter.check_rate_limit("1.2.3.4"));
        // Other keys are unaffected.
        assert!(limiter.check_rate_limit("5.6.7.8"));
    }
}
