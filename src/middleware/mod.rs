//! Middleware module for the Palisade HTTP layer
//!
//! Provides:
//! - Authentication middleware (Bearer token / `token` cookie)
//! - Rate limiting layer (hard ceiling + progressive slowdown)
//! - Role-based authorization helpers

pub mod auth;
pub mod rate_limit;

use axum::extract::ConnectInfo;
use axum::http::{header, Request};
use palisade_core::{ClientKey, RequestMeta};
use std::net::SocketAddr;

/// Derive the rate-limit bucketing key from the request's origin.
/// Peer address first, `X-Forwarded-For` as fallback behind a proxy.
pub(crate) fn client_key<B>(req: &Request<B>) -> ClientKey {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return ClientKey::from(addr.ip());
    }

    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(ip) = value.split(',').next() {
                return ClientKey::new(ip.trim());
            }
        }
    }

    ClientKey::new("unknown")
}

/// Build the transport-agnostic request view the core gates consume
pub(crate) fn request_meta<B>(req: &Request<B>) -> RequestMeta {
    let mut meta = RequestMeta::new(req.uri().path(), client_key(req));

    if let Some(value) = header_str(req, header::AUTHORIZATION) {
        meta = meta.with_authorization(value);
    }
    if let Some(value) = header_str(req, header::COOKIE) {
        meta = meta.with_cookie(value);
    }

    meta
}

fn header_str<B>(req: &Request<B>, name: header::HeaderName) -> Option<&str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}
