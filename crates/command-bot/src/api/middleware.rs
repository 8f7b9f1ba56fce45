//! Rate limiting and request logging middleware.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{debug, trace, warn};

/// Global rate limiter (not keyed).
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const FALLBACK_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(600) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

/// Rate limiter state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    pub fn new(requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(requests_per_minute).unwrap_or(FALLBACK_PER_MINUTE),
        );

        Self {
            global: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create a permissive rate limiter for testing.
    pub fn permissive() -> Self {
        Self::new(100_000)
    }
}

/// Rejects requests with 429 once the global limit is exceeded.
///
/// Discord retries interactions it gets no answer for, so the response says
/// when capacity frees up again.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(not_until) = rate_limit.global.check() {
        let wait = not_until.wait_time_from(DefaultClock::default().now());
        warn!(retry_after = ?wait, "Global rate limit exceeded");

        let mut response = AppError::RateLimitExceeded.into_response();
        let secs = wait.as_secs_f64().ceil().max(1.0) as u64;
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        return response;
    }

    next.run(request).await
}

/// Logs every request with its outcome and latency.
///
/// Health probes only log at trace level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if path == "/health" {
        trace!(%method, path, status, elapsed_ms, "Health probe");
    } else if response.status().is_success() {
        debug!(%method, path, status, elapsed_ms, "Request handled");
    } else {
        warn!(%method, path, status, elapsed_ms, "Request rejected");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_exhaustion() {
        let state = RateLimitState::new(1);

        assert!(state.global.check().is_ok());
        assert!(state.global.check().is_err());
    }

    #[test]
    fn test_zero_falls_back() {
        let state = RateLimitState::new(0);
        for _ in 0..100 {
            assert!(state.global.check().is_ok());
        }
    }
}
