//! Palisade - request-gating demo server
//!
//! Entry point: loads configuration from the environment (fatal if the
//! signing secret is missing), initializes logging, and serves the gated
//! router.

#![forbid(unsafe_code)]

use anyhow::Result;
use palisade::server;
use palisade_core::GateConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palisade=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration errors are fatal before the listener binds
    let config = GateConfig::from_env()?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting palisade");
    server::run(config).await
}
