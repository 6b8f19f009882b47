//! Palisade - request-gating middleware for axum
//!
//! Adapts the transport-agnostic gates from `palisade-core` onto an axum
//! router: a rate-limiting tower layer applied ahead of authentication, an
//! authentication middleware that attaches the verified identity to request
//! extensions, and per-route role checks.

#![forbid(unsafe_code)]

pub mod api;
pub mod middleware;
pub mod server;
