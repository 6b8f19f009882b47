//! Rate limiting for request throttling
//!
//! Two cooperating sub-policies, each with independent per-client windows:
//! a hard ceiling that rejects once a client exceeds the per-window maximum,
//! and a progressive slowdown that delays (never rejects) requests past a
//! threshold. State is sharded per client key; distinct keys never contend
//! and same-key updates are atomic under the map's entry lock.

use crate::error::GateError;
use crate::gate::{Decision, Gate, GateContext, RequestMeta};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Hard ceiling configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window per client key
    pub max_requests: u32,
    /// Fixed window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl RateLimitConfig {
    /// Create a new rate limit config
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// Progressive slowdown configuration
#[derive(Debug, Clone)]
pub struct SlowdownConfig {
    /// In-window request count after which the delay applies
    pub delay_after: u32,
    /// Delay served to every request past the threshold
    pub delay: Duration,
    /// Fixed window duration (independent of the ceiling's window)
    pub window: Duration,
}

impl Default for SlowdownConfig {
    fn default() -> Self {
        Self {
            delay_after: 50,
            delay: Duration::from_millis(500),
            window: Duration::from_secs(15 * 60),
        }
    }
}

/// Result of a ceiling check
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Remaining requests in the current window
    pub remaining: u32,
    /// Time until the client's window resets
    pub reset_after: Duration,
    /// Post-increment request count in the window
    pub current: u32,
}

/// One counter per client per active window. Counters for elapsed windows
/// are reset, never incremented.
#[derive(Debug)]
struct WindowCounter {
    window_start: Instant,
    count: u32,
}

impl WindowCounter {
    fn fresh(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
        }
    }

    /// Reset if the window has elapsed, then count this request
    fn tick(&mut self, now: Instant, window: Duration) -> u32 {
        if now.duration_since(self.window_start) >= window {
            self.window_start = now;
            self.count = 0;
        }
        self.count += 1;
        self.count
    }

    fn reset_after(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.duration_since(self.window_start))
    }
}

/// In-memory fixed-window rate limiter, sharded by client key
#[derive(Debug, Default)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, WindowCounter>,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// The configured per-window maximum
    pub fn max_requests(&self) -> u32 {
        self.config.max_requests
    }

    /// Count a request for the key and decide whether it is allowed.
    ///
    /// The increment and the decision happen under the entry lock, so
    /// concurrent requests from the same client cannot double-count or
    /// lose increments. Denied requests stay counted.
    pub fn acquire(&self, key: &str) -> RateLimitResult {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowCounter::fresh(now));

        let current = entry.tick(now, self.config.window);
        let reset_after = entry.reset_after(now, self.config.window);
        drop(entry);

        let allowed = current <= self.config.max_requests;
        if !allowed {
            warn!(key = %key, current, max = self.config.max_requests, "rate limit exceeded");
        }

        RateLimitResult {
            allowed,
            remaining: self.config.max_requests.saturating_sub(current),
            reset_after,
            current,
        }
    }

    /// Current in-window usage for a key as (current, max)
    pub fn usage(&self, key: &str) -> (u32, u32) {
        let now = Instant::now();
        let current = match self.windows.get(key) {
            Some(entry) if now.duration_since(entry.window_start) < self.config.window => {
                entry.count
            }
            _ => 0,
        };
        (current, self.config.max_requests)
    }

    /// Forget a key's counter
    pub fn reset(&self, key: &str) {
        self.windows.remove(key);
    }

    /// Drop counters whose windows have elapsed, returning how many
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, counter| now.duration_since(counter.window_start) < self.config.window);
        before - self.windows.len()
    }
}

/// Per-client request pacing governor.
///
/// Tracks its own fixed window per key and maps "requests so far beyond the
/// threshold" to a delay. The delay function is constant past the threshold;
/// the request is only delayed, never rejected.
#[derive(Debug, Default)]
pub struct SlowdownGovernor {
    config: SlowdownConfig,
    windows: DashMap<String, WindowCounter>,
}

impl SlowdownGovernor {
    /// Create a new governor
    #[must_use]
    pub fn new(config: SlowdownConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Count a request and return the delay to serve before forwarding it.
    /// Zero through the threshold, the configured delay past it.
    pub fn check(&self, key: &str) -> Duration {
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowCounter::fresh(now));

        let current = entry.tick(now, self.config.window);
        drop(entry);

        if current > self.config.delay_after {
            debug!(key = %key, current, threshold = self.config.delay_after, "pacing request");
            self.config.delay
        } else {
            Duration::ZERO
        }
    }

    /// Drop counters whose windows have elapsed, returning how many
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, counter| now.duration_since(counter.window_start) < self.config.window);
        before - self.windows.len()
    }
}

/// Outcome of a scoped throttle check, carrying the ceiling usage so
/// callers can render informational headers.
#[derive(Debug)]
pub enum Throttle {
    /// Path outside the gate's scope; untouched by either policy
    OutOfScope,
    /// Allowed with no delay
    Allow(RateLimitResult),
    /// Allowed after the pacing delay
    Delay(RateLimitResult, Duration),
    /// Over the ceiling
    Reject(RateLimitResult),
}

/// Throttling gate applied ahead of authentication.
///
/// Evaluates the hard ceiling first, then the slowdown, but only for paths
/// under the configured scope; static assets and health checks outside the
/// scope pass untouched.
pub struct RateGate {
    limiter: RateLimiter,
    governor: SlowdownGovernor,
    scope: String,
}

impl RateGate {
    /// Create a rate gate scoped to a path prefix (e.g. `/api`)
    pub fn new(rate: RateLimitConfig, slowdown: SlowdownConfig, scope: impl Into<String>) -> Self {
        Self {
            limiter: RateLimiter::new(rate),
            governor: SlowdownGovernor::new(slowdown),
            scope: scope.into(),
        }
    }

    /// The ceiling limiter (for informational headers)
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The slowdown governor
    pub fn governor(&self) -> &SlowdownGovernor {
        &self.governor
    }

    /// Run both policies for one request: scope first, then the ceiling,
    /// then the slowdown. The single source of the evaluation order for
    /// every transport adapter.
    pub fn check(&self, path: &str, key: &str) -> Throttle {
        if !path.starts_with(&self.scope) {
            return Throttle::OutOfScope;
        }

        let result = self.limiter.acquire(key);
        if !result.allowed {
            return Throttle::Reject(result);
        }

        let delay = self.governor.check(key);
        if delay.is_zero() {
            Throttle::Allow(result)
        } else {
            Throttle::Delay(result, delay)
        }
    }
}

impl Gate for RateGate {
    fn evaluate(&self, meta: &RequestMeta, _ctx: &mut GateContext) -> Decision {
        match self.check(&meta.path, meta.client.as_str()) {
            Throttle::OutOfScope | Throttle::Allow(_) => Decision::Allow,
            Throttle::Delay(_, delay) => Decision::Delay(delay),
            Throttle::Reject(result) => Decision::Reject(GateError::RateLimited {
                retry_after: result.reset_after,
            }),
        }
    }
}
