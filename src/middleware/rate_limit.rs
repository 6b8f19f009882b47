//! Rate limiting middleware for Axum
//!
//! Wraps the core `RateGate` as a tower layer applied ahead of
//! authentication. The hard ceiling answers 429 without forwarding; the
//! slowdown suspends only the current request's task before letting it
//! through. Scope and evaluation order live in the core gate; this layer
//! only renders its outcome onto HTTP.

use axum::{
    http::{HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use palisade_core::{RateGate, RateLimitConfig, RateLimitResult, SlowdownConfig, Throttle};
use serde::Serialize;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct RateLimitResponse {
    success: bool,
    error: String,
    code: String,
    retry_after_secs: u64,
}

/// Shared throttling state, cloned into every service instance
#[derive(Clone)]
pub struct RateLimitState {
    gate: Arc<RateGate>,
}

impl RateLimitState {
    /// Create throttling state scoped to a path prefix
    pub fn new(rate: RateLimitConfig, slowdown: SlowdownConfig, scope: impl Into<String>) -> Self {
        Self {
            gate: Arc::new(RateGate::new(rate, slowdown, scope)),
        }
    }

    /// Spawn periodic eviction of counters for idle clients
    pub fn spawn_cleanup(&self) {
        let gate = self.gate.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                let dropped = gate.limiter().cleanup() + gate.governor().cleanup();
                if dropped > 0 {
                    debug!(dropped, "evicted expired rate windows");
                }
            }
        });
    }
}

/// Rate limiting layer for Axum
#[derive(Clone)]
pub struct RateLimitLayer {
    state: RateLimitState,
}

impl RateLimitLayer {
    /// Create a new rate limit layer
    pub fn new(rate: RateLimitConfig, slowdown: SlowdownConfig, scope: impl Into<String>) -> Self {
        Self {
            state: RateLimitState::new(rate, slowdown, scope),
        }
    }

    /// Get the inner state (for cleanup scheduling)
    pub fn state(&self) -> &RateLimitState {
        &self.state
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            state: self.state.clone(),
        }
    }
}

/// Rate limiting service wrapper
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    state: RateLimitState,
}

type BoxFuture<T, E> =
    std::pin::Pin<Box<dyn std::future::Future<Output = std::result::Result<T, E>> + Send>>;

impl<S, B> Service<Request<B>> for RateLimitService<S>
where
    S: Service<Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Response, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> BoxFuture<Response, S::Error> {
        let state = self.state.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let key = super::client_key(&req);

            let result = match state.gate.check(req.uri().path(), key.as_str()) {
                Throttle::OutOfScope => return inner.call(req).await,
                Throttle::Reject(result) => {
                    warn!(key = %key, retry_after_secs = result.reset_after.as_secs(), "rate limit exceeded");
                    return Ok(rate_limited_response(&result));
                }
                Throttle::Allow(result) => result,
                Throttle::Delay(result, delay) => {
                    // Suspends this request's task only, then proceeds
                    debug!(key = %key, delay_ms = delay.as_millis() as u64, "pacing request");
                    tokio::time::sleep(delay).await;
                    result
                }
            };

            let mut response = inner.call(req).await?;
            attach_limit_headers(&mut response, &result, state.gate.limiter().max_requests());
            Ok(response)
        })
    }
}

fn rate_limited_response(result: &RateLimitResult) -> Response {
    let retry_after_secs = result.reset_after.as_secs();
    let body = RateLimitResponse {
        success: false,
        error: "Too many requests, please try again later".to_string(),
        code: "RATE_LIMITED".to_string(),
        retry_after_secs,
    };

    (
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", retry_after_secs.to_string())],
        Json(body),
    )
        .into_response()
}

fn attach_limit_headers(response: &mut Response, result: &RateLimitResult, limit: u32) {
    let headers = response.headers_mut();
    for (name, value) in [
        ("X-RateLimit-Limit", limit.to_string()),
        ("X-RateLimit-Remaining", result.remaining.to_string()),
        ("X-RateLimit-Reset", result.reset_after.as_secs().to_string()),
    ] {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(name, value);
        }
    }
}
