mod auth;
mod chat;
mod config;
mod db;
mod errors;
mod export;
mod gateway;
mod history;
mod i18n;
mod models;
mod paywall;
mod pipeline;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::gateway::GeminiClient;
use crate::paywall::SimulatedProcessor;
use crate::pipeline::sessions::SessionRegistry;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryRecordStore, PgRecordStore, RecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Boost API v{}", env!("CARGO_PKG_VERSION"));

    // Record store: PostgreSQL when configured, in-process otherwise
    let store: Arc<dyn RecordStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            info!("PostgreSQL record store initialized");
            Arc::new(PgRecordStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; optimizations are kept in memory and lost on restart");
            Arc::new(MemoryRecordStore::new())
        }
    };

    // Initialize the AI gateway
    let gateway = Arc::new(GeminiClient::new(config.gemini_api_key.clone())?);
    info!("AI gateway initialized (Gemini)");

    let payments = Arc::new(SimulatedProcessor::new(
        Duration::from_millis(config.payment_processing_delay_ms),
        Duration::from_millis(config.payment_success_delay_ms),
    ));
    if !config.paywall_enabled {
        warn!("Paywall disabled: every new document is created unlocked");
    }

    let sessions = SessionRegistry::new();
    sessions.spawn_idle_purge(Duration::from_secs(config.session_idle_ttl_secs));

    // Build app state
    let state = AppState {
        store,
        gateway,
        payments,
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
