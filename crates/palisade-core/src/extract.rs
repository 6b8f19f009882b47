//! Candidate token extraction
//!
//! A token may arrive in one of two carriers. Precedence order, first match
//! wins: the `Authorization` header with a `Bearer ` prefix, then a cookie
//! named `token`. Absence of both is not an error by itself; the auth gate
//! turns `None` into a rejection.

use crate::gate::RequestMeta;

/// Name of the cookie carrying a token
pub const TOKEN_COOKIE: &str = "token";

/// Extract a bearer token from an `Authorization` header value.
///
/// Returns `None` when the value does not start with the literal `Bearer `
/// prefix; the remainder after the prefix is the token.
pub fn bearer_token(value: &str) -> Option<&str> {
    value.strip_prefix("Bearer ").map(str::trim)
}

/// Find a named cookie's value inside a raw `Cookie` header
pub fn cookie_token<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Pull the candidate token from a request, header before cookie
pub fn extract_token(meta: &RequestMeta) -> Option<&str> {
    if let Some(authorization) = meta.authorization.as_deref() {
        if let Some(token) = bearer_token(authorization) {
            return Some(token);
        }
    }

    meta.cookie
        .as_deref()
        .and_then(|header| cookie_token(header, TOKEN_COOKIE))
}
