//! Server assembly for Palisade
//!
//! Builds the gate pipeline onto an axum router: `/health` stays open,
//! everything under the configured scope passes the rate gate and then the
//! auth gate, and admin routes additionally check a role set. The routes
//! here are demonstration handlers; real business routes belong to the
//! application mounting the middleware.

use crate::api;
use crate::middleware::auth::{authenticate, require_role, GateRejection, RequireIdentity};
use crate::middleware::rate_limit::RateLimitLayer;
use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use palisade_core::{AuthGate, GateConfig, Identity, TokenCodec};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the gated router from configuration
pub fn router(config: &GateConfig) -> Router {
    build(config, rate_limit_layer(config))
}

fn rate_limit_layer(config: &GateConfig) -> RateLimitLayer {
    RateLimitLayer::new(
        config.rate_limit(),
        config.slowdown(),
        config.scope.clone(),
    )
}

fn build(config: &GateConfig, rate_limit: RateLimitLayer) -> Router {
    let codec = Arc::new(TokenCodec::new(&config.secret));
    let auth_gate = Arc::new(AuthGate::new(codec));

    let gated = Router::new()
        .route("/api/me", get(me))
        .route("/api/admin/stats", get(admin_stats))
        .layer(from_fn_with_state(auth_gate, authenticate));

    api::health::routes()
        .merge(gated)
        .layer(rate_limit)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until a shutdown signal arrives
pub async fn run(config: GateConfig) -> anyhow::Result<()> {
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3030);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let rate_limit = rate_limit_layer(&config);
    rate_limit.state().spawn_cleanup();
    let app = build(&config, rate_limit);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, scope = %config.scope, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

#[derive(Debug, Serialize)]
struct MeResponse {
    success: bool,
    identity: Identity,
}

/// Who the caller is, per their verified token
async fn me(RequireIdentity(identity): RequireIdentity) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        identity,
    })
}

#[derive(Debug, Serialize)]
struct AdminStatsResponse {
    success: bool,
    role: String,
}

/// Admin-only demo route: any authenticated caller reaches it, but only
/// the admin/staff roles pass the role gate
async fn admin_stats(
    RequireIdentity(identity): RequireIdentity,
) -> Result<Json<AdminStatsResponse>, GateRejection> {
    require_role(&identity, &["admin", "staff"])?;

    Ok(Json(AdminStatsResponse {
        success: true,
        role: identity.role,
    }))
}
