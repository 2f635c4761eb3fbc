//! lotplan-resolver: HTTP search service over the state cadastre layers.
//!
//! See `lotplan_resolver::config` for the environment variables read.

use std::sync::Arc;

use anyhow::Context;
use lotplan_resolver::{build_router, ArcGisClient, Limits, ResolverConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lotplan_resolver=debug,tower_http=info".into()),
        )
        .init();

    let config = ResolverConfig::from_env()?;
    let client = ArcGisClient::new(config.endpoints.clone(), config.upstream_timeout)?;

    let app = build_router(
        Arc::new(client),
        Limits {
            max_queries: config.max_queries,
        },
    );

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("lotplan-resolver listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
