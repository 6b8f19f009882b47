//! Gate pipeline configuration
//!
//! Read once at process start and passed explicitly into the codec and
//! rate gate at construction time; nothing reads ambient globals ad hoc,
//! so tests can run isolated pipelines with distinct secrets.

use crate::error::{GateError, Result};
use crate::rate_limit::{RateLimitConfig, SlowdownConfig};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the whole gate pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Token signing secret (required, non-empty)
    pub secret: String,
    /// Lifetime of minted tokens, seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Ceiling: max requests per window per client key
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Ceiling window, milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Slowdown: in-window request count after which delays apply
    #[serde(default = "default_delay_after")]
    pub delay_after: u32,
    /// Slowdown: delay per paced request, milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Path prefix the rate gate applies to
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_token_ttl_secs() -> u64 {
    86_400
}
fn default_max_requests() -> u32 {
    100
}
fn default_window_ms() -> u64 {
    900_000
}
fn default_delay_after() -> u32 {
    50
}
fn default_delay_ms() -> u64 {
    500
}
fn default_scope() -> String {
    "/api".to_string()
}

impl GateConfig {
    /// Build a config with defaults around the given secret
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(GateError::Configuration(
                "signing secret must not be empty".to_string(),
            ));
        }

        Ok(Self {
            secret,
            token_ttl_secs: default_token_ttl_secs(),
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            delay_after: default_delay_after(),
            delay_ms: default_delay_ms(),
            scope: default_scope(),
        })
    }

    /// Read configuration from the environment, once, at startup.
    ///
    /// `JWT_SECRET` is required; a missing or empty value is fatal. The
    /// remaining variables fall back to their defaults, but a present value
    /// that fails to parse is a configuration error, not a silent default.
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GateError::Configuration("JWT_SECRET is not set".to_string()))?;

        let mut config = Self::new(secret)?;
        if let Some(ttl) = parse_env("JWT_EXPIRATION_SECS")? {
            config.token_ttl_secs = ttl;
        }
        if let Some(max) = parse_env("RATE_LIMIT_MAX_REQUESTS")? {
            config.max_requests = max;
        }
        if let Some(window) = parse_env("RATE_LIMIT_WINDOW_MS")? {
            config.window_ms = window;
        }
        if let Some(after) = parse_env("SLOW_DOWN_AFTER")? {
            config.delay_after = after;
        }
        if let Some(delay) = parse_env("SLOW_DOWN_DELAY_MS")? {
            config.delay_ms = delay;
        }
        if let Ok(scope) = std::env::var("RATE_LIMIT_SCOPE") {
            config.scope = scope;
        }

        Ok(config)
    }

    /// Ceiling configuration for the rate gate
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.max_requests, Duration::from_millis(self.window_ms))
    }

    /// Slowdown configuration for the rate gate
    pub fn slowdown(&self) -> SlowdownConfig {
        SlowdownConfig {
            delay_after: self.delay_after,
            delay: Duration::from_millis(self.delay_ms),
            window: Duration::from_millis(self.window_ms),
        }
    }

    /// Lifetime for minted tokens
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            GateError::Configuration(format!("{name} has an invalid value: {raw:?}"))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GateConfig::new("secret").unwrap();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.rate_limit().window, Duration::from_secs(900));
        assert_eq!(config.slowdown().delay_after, 50);
        assert_eq!(config.slowdown().delay, Duration::from_millis(500));
        assert_eq!(config.scope, "/api");
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        let err = GateConfig::new("").unwrap_err();
        assert!(matches!(err, GateError::Configuration(_)));
    }

    // Environment access is process-global, so every from_env scenario
    // lives in this one test to keep it race-free under the parallel
    // test runner.
    #[test]
    fn test_from_env() {
        std::env::remove_var("JWT_SECRET");
        assert!(matches!(
            GateConfig::from_env().unwrap_err(),
            GateError::Configuration(_)
        ));

        std::env::set_var("JWT_SECRET", "env-secret");
        std::env::set_var("RATE_LIMIT_MAX_REQUESTS", "25");
        std::env::set_var("RATE_LIMIT_WINDOW_MS", "60000");
        std::env::set_var("SLOW_DOWN_AFTER", "10");
        std::env::set_var("SLOW_DOWN_DELAY_MS", "250");
        let config = GateConfig::from_env().unwrap();
        assert_eq!(config.secret, "env-secret");
        assert_eq!(config.max_requests, 25);
        assert_eq!(config.window_ms, 60_000);
        assert_eq!(config.delay_after, 10);
        assert_eq!(config.delay_ms, 250);

        std::env::set_var("RATE_LIMIT_MAX_REQUESTS", "not-a-number");
        assert!(matches!(
            GateConfig::from_env().unwrap_err(),
            GateError::Configuration(_)
        ));

        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("RATE_LIMIT_MAX_REQUESTS");
        std::env::remove_var("RATE_LIMIT_WINDOW_MS");
        std::env::remove_var("SLOW_DOWN_AFTER");
        std::env::remove_var("SLOW_DOWN_DELAY_MS");
    }
}
