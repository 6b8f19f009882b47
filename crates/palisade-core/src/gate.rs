//! Uniform gate decision pipeline
//!
//! Each gate is a pure decision function over (request metadata, shared
//! state) producing Allow, Reject, or Delay. The chain executes gates in
//! order and stops at the first rejection; delays accumulate and are served
//! by the caller before the request proceeds.

use crate::error::GateError;
use crate::identity::Identity;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Bucketing key used to group requests for rate limiting.
///
/// Derived from the request's origin (typically the source address);
/// unique per distinct origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    /// Create a key from an opaque origin string
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<IpAddr> for ClientKey {
    fn from(addr: IpAddr) -> Self {
        Self(addr.to_string())
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport-agnostic view of an inbound request.
///
/// The surrounding server layer builds one of these per request; the gates
/// never see the transport itself.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Request path
    pub path: String,
    /// Rate-limit bucketing key for the request's origin
    pub client: ClientKey,
    /// Raw `Authorization` header value, if present
    pub authorization: Option<String>,
    /// Raw `Cookie` header value, if present
    pub cookie: Option<String>,
}

impl RequestMeta {
    /// Create metadata for a request with no token carriers
    pub fn new(path: impl Into<String>, client: ClientKey) -> Self {
        Self {
            path: path.into(),
            client,
            authorization: None,
            cookie: None,
        }
    }

    /// Set the raw `Authorization` header value
    #[must_use]
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Set the raw `Cookie` header value
    #[must_use]
    pub fn with_cookie(mut self, value: impl Into<String>) -> Self {
        self.cookie = Some(value.into());
        self
    }
}

/// Outcome of a single gate evaluation
#[derive(Debug)]
pub enum Decision {
    /// Continue to the next gate
    Allow,
    /// Stop the chain and answer with the failure
    Reject(GateError),
    /// Suspend this request for the duration, then continue
    Delay(Duration),
}

/// Per-request mutable context threaded through the chain.
///
/// Scoped to a single request's lifetime; no global state is touched.
#[derive(Debug, Default)]
pub struct GateContext {
    /// Identity attached by the auth gate on success
    pub identity: Option<Identity>,
}

/// A single-purpose decision stage in the request pipeline
pub trait Gate: Send + Sync {
    /// Evaluate the request, possibly attaching identity to the context
    fn evaluate(&self, meta: &RequestMeta, ctx: &mut GateContext) -> Decision;
}

/// Result of running a full chain
#[derive(Debug)]
pub struct ChainOutcome {
    /// Total delay the caller must serve before forwarding the request
    pub delay: Duration,
    /// `Ok` to forward downstream, `Err` to answer with the failure
    pub result: Result<(), GateError>,
}

impl ChainOutcome {
    /// Whether the request may be forwarded downstream
    pub fn allowed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ordered list of gates, executed in order with short-circuit on rejection
#[derive(Default)]
pub struct GateChain {
    gates: Vec<Box<dyn Gate>>,
}

impl GateChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a gate to the end of the chain
    #[must_use]
    pub fn with(mut self, gate: impl Gate + 'static) -> Self {
        self.gates.push(Box::new(gate));
        self
    }

    /// Number of gates in the chain
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the chain has no gates
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Run the chain for one request.
    ///
    /// Stops at the first rejection. Delays do not stop the chain; they are
    /// summed into the outcome for the caller to serve before forwarding.
    pub fn evaluate(&self, meta: &RequestMeta, ctx: &mut GateContext) -> ChainOutcome {
        let mut delay = Duration::ZERO;

        for gate in &self.gates {
            match gate.evaluate(meta, ctx) {
                Decision::Allow => {}
                Decision::Delay(d) => delay += d,
                Decision::Reject(err) => {
                    return ChainOutcome {
                        delay,
                        result: Err(err),
                    }
                }
            }
        }

        ChainOutcome {
            delay,
            result: Ok(()),
        }
    }
}
