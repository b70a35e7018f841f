mod config;
mod db;
mod errors;
mod estimate;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;
mod vin;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgJobStore;
use crate::vin::VinClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on missing or malformed env vars
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting estimate API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgJobStore::new(db));

    // Initialize LLM client
    let llm = LlmClient::new(&config.llm);
    info!(
        "LLM client initialized ({:?}, model: {})",
        config.llm.provider,
        llm.model()
    );

    let vin = VinClient::new(config.vin_decode_url.clone(), config.vin_timeout);

    match config.pricing.tax_rate_percent {
        Some(rate) => info!(
            "Pricing defaults: ${:.2}/h, supplies {}%, tax set-aside {}%",
            config.pricing.default_labor_rate, config.pricing.shop_supplies_percent, rate
        ),
        None => info!(
            "Pricing defaults: ${:.2}/h, supplies {}%, no tax set-aside",
            config.pricing.default_labor_rate, config.pricing.shop_supplies_percent
        ),
    }

    // Build app state
    let state = AppState {
        pricing: config.pricing.clone(),
        store,
        generator: Arc::new(llm),
        vin,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the shop frontend has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
