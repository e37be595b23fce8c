use anyhow::Result;
use axum::{routing::get, Json, Router};
use data_sources::{
    LiveMetricSource, OpenAiAdvisory, OverpassClient, PowerClient, TtlCache,
};
use site_planner::SitePlanner;
use std::sync::Arc;
use suitability_core::{AdvisoryProvider, InfrastructureSource};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod recommendations;
mod routes;

use config::GatewayConfig;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "suitability_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env();
    let ttl = config.cache.ttl();
    tracing::info!("   Source cache TTL: {}s", ttl.as_secs());

    let power = PowerClient::new(config.power.clone(), Arc::new(TtlCache::new(ttl)))?;
    let overpass = OverpassClient::new(config.overpass.clone(), Arc::new(TtlCache::new(ttl)))?;
    let infrastructure: Arc<dyn InfrastructureSource> = Arc::new(overpass);

    let advisory: Option<Arc<dyn AdvisoryProvider>> = match config.advisory.clone() {
        Some(advisory_config) => {
            let client = OpenAiAdvisory::new(advisory_config)?;
            tracing::info!("   Advisory model: {}", client.model());
            Some(Arc::new(client) as Arc<dyn AdvisoryProvider>)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set - planning suggestions will use ranked fallback");
            None
        }
    };

    let planner = SitePlanner::new(Arc::new(LiveMetricSource::new(power)), infrastructure.clone())
        .with_advisory(advisory);

    let state = AppState {
        planner,
        infrastructure,
    };

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/map", routes::map_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.addr();
    tracing::info!("Suitability Gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "suitability-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
