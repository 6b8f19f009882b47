//! Health check endpoint
//!
//! `/health` — "healthy" plus version and uptime, for load balancers.
//! Lives outside the rate-limit scope and requires no authentication.

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;

// Fixed at the first router build for the life of the process
static STARTED: OnceLock<Instant> = OnceLock::new();

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Seconds since the process started serving
    pub uptime: u64,
}

async fn health_check() -> Json<HealthResponse> {
    let started = STARTED.get_or_init(Instant::now);
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime: started.elapsed().as_secs(),
    })
}

/// Router for the health endpoint
pub fn routes() -> Router {
    STARTED.get_or_init(Instant::now);
    Router::new().route("/health", get(health_check))
}
