//! Palisade Core - Request Gating Engine
//!
//! This crate provides the transport-agnostic gating logic for the Palisade
//! request pipeline, including:
//! - Token: Signed identity token verification (JWT, HS256)
//! - Extract: Pulling a candidate token out of a request (header or cookie)
//! - Auth: Turning a request into an authenticated identity, or a 401
//! - Role: Allowing or denying an identity against a required role set
//! - Rate limiting: Per-client hard ceiling plus progressive slowdown
//! - Gate chain: Uniform decision pipeline over all of the above

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod gate;
pub mod identity;
pub mod rate_limit;
pub mod role;
pub mod token;

pub use auth::AuthGate;
pub use config::GateConfig;
pub use error::{GateError, Result};
pub use extract::{bearer_token, cookie_token, extract_token, TOKEN_COOKIE};
pub use gate::{ChainOutcome, ClientKey, Decision, Gate, GateChain, GateContext, RequestMeta};
pub use identity::Identity;
pub use rate_limit::{
    RateGate, RateLimitConfig, RateLimitResult, RateLimiter, SlowdownConfig, SlowdownGovernor,
    Throttle,
};
pub use role::RoleGate;
pub use token::{Claims, TokenCodec, TokenError};
