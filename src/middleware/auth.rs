//! Authentication middleware for Axum
//!
//! Runs the core auth gate over each request, attaches the verified
//! `Identity` to request extensions, and renders gate failures as JSON
//! responses with their contract status codes (401/403/429).

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::RETRY_AFTER, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use palisade_core::{AuthGate, GateError, Identity, RoleGate};
use serde::Serialize;
use std::sync::Arc;

/// JSON error body for gate failures
#[derive(Debug, Serialize)]
struct GateErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl GateErrorResponse {
    fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Gate rejection rendered to the caller
pub struct GateRejection {
    status: StatusCode,
    body: GateErrorResponse,
    retry_after_secs: Option<u64>,
}

impl GateRejection {
    /// The status code this rejection renders with
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let retry_after = self.retry_after_secs;
        let mut response = (self.status, Json(self.body)).into_response();

        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<GateError> for GateRejection {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Unauthorized { reason } => GateRejection {
                status: StatusCode::UNAUTHORIZED,
                body: GateErrorResponse::new(reason, "UNAUTHORIZED"),
                retry_after_secs: None,
            },
            GateError::Forbidden { reason } => GateRejection {
                status: StatusCode::FORBIDDEN,
                body: GateErrorResponse::new(reason, "FORBIDDEN"),
                retry_after_secs: None,
            },
            GateError::RateLimited { retry_after } => GateRejection {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: GateErrorResponse::new(
                    "Too many requests, please try again later",
                    "RATE_LIMITED",
                ),
                retry_after_secs: Some(retry_after.as_secs()),
            },
            GateError::Configuration(msg) => GateRejection {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: GateErrorResponse::new(msg, "INTERNAL_ERROR"),
                retry_after_secs: None,
            },
        }
    }
}

/// Axum middleware that authenticates every request it wraps.
///
/// On success the `Identity` is inserted into request extensions for the
/// request's lifetime; on failure the chain stops with a 401.
pub async fn authenticate(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateRejection> {
    let meta = super::request_meta(&req);
    let identity = gate.authenticate(&meta).map_err(GateRejection::from)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Extractor for the identity attached by [`authenticate`].
///
/// Rejects with 401 when no identity is present, so role-guarded handlers
/// stay safe even if the middleware was not applied to their route.
pub struct RequireIdentity(pub Identity);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(RequireIdentity)
            .ok_or_else(|| GateRejection::from(GateError::unauthorized("not authenticated")))
    }
}

/// Check a role requirement inside a handler
pub fn require_role(
    identity: &Identity,
    required: &[&str],
) -> std::result::Result<(), GateRejection> {
    RoleGate::new(required.iter().copied())
        .authorize(Some(identity))
        .map_err(GateRejection::from)
}
