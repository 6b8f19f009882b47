//! Auth gate: extraction plus verification
//!
//! Orchestrates token extraction and codec verification, attaches the
//! resulting identity to the request context, and classifies failures.
//! Terminal outcomes only: a single request either passes or fails once.

use crate::error::{GateError, Result};
use crate::extract::extract_token;
use crate::gate::{Decision, Gate, GateContext, RequestMeta};
use crate::identity::Identity;
use crate::token::{TokenCodec, TokenError};
use std::sync::Arc;
use tracing::warn;

/// Authenticates requests against the shared token codec
pub struct AuthGate {
    codec: Arc<TokenCodec>,
}

impl AuthGate {
    /// Create an auth gate over the given codec
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Authenticate a request, returning its identity or a 401-class error.
    ///
    /// Failure messages are stable: "missing token" when no carrier holds a
    /// token, "token expired" for expiry, "invalid token" for a bad
    /// signature or malformed input.
    pub fn authenticate(&self, meta: &RequestMeta) -> Result<Identity> {
        let Some(token) = extract_token(meta) else {
            return Err(GateError::unauthorized("missing token"));
        };

        match self.codec.verify(token) {
            Ok(identity) => Ok(identity),
            Err(TokenError::Expired) => Err(GateError::unauthorized("token expired")),
            Err(TokenError::InvalidSignature) | Err(TokenError::Malformed) => {
                warn!(path = %meta.path, "invalid token attempt");
                Err(GateError::unauthorized("invalid token"))
            }
        }
    }
}

impl Gate for AuthGate {
    fn evaluate(&self, meta: &RequestMeta, ctx: &mut GateContext) -> Decision {
        match self.authenticate(meta) {
            Ok(identity) => {
                ctx.identity = Some(identity);
                Decision::Allow
            }
            Err(err) => Decision::Reject(err),
        }
    }
}
