//! Error types for palisade-core
//!
//! Every gate converts its internal failure into exactly one of these kinds
//! and stops the chain. The numeric status codes are part of the contract:
//! 401 = not authenticated, 403 = insufficient role, 429 = rate limited.

use std::time::Duration;
use thiserror::Error;

/// Gate failure taxonomy
#[derive(Debug, Error)]
pub enum GateError {
    /// No token, malformed token, bad signature, or expired token.
    /// Recoverable by the caller via re-authentication.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// Why authentication failed
        reason: String,
    },

    /// Valid identity lacking a required role. Retrying with the same
    /// identity will not succeed.
    #[error("forbidden: {reason}")]
    Forbidden {
        /// Why authorization failed
        reason: String,
    },

    /// Too many requests from a client key within the window.
    /// Recoverable by waiting.
    #[error("rate limit exceeded")]
    RateLimited {
        /// Time until the client's window resets
        retry_after: Duration,
    },

    /// Missing or invalid configuration at startup. Fatal: the process
    /// must not begin serving until resolved.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GateError {
    /// Build an `Unauthorized` error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Build a `Forbidden` error
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Stable HTTP-equivalent status code for this failure
    pub fn status(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 401,
            Self::Forbidden { .. } => 403,
            Self::RateLimited { .. } => 429,
            Self::Configuration(_) => 500,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GateError>;
