//! Portfolio Advisor HTTP Server
//!
//! Axum-based server exposing the advisory pipeline as a JSON API.

mod handlers;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::{GeminiConfig, GeminiProvider};
use portfolio_advisor::{AdvisorConfig, MarketDataProvider, MarketSource, MockMarketData, YahooFinanceClient};

use crate::handlers::{health_check, recommend, universe};
use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/api/universe", get(universe))

        // Advisor API
        .route("/api/recommend", post(recommend))

        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

fn market_provider(config: &AdvisorConfig) -> anyhow::Result<Arc<dyn MarketDataProvider>> {
    Ok(match config.market_source {
        MarketSource::Yahoo => Arc::new(YahooFinanceClient::new(Duration::from_secs(config.fetch_timeout_secs))?),
        MarketSource::Mock => Arc::new(MockMarketData::new()),
    })
}

fn explanation_provider(config: &AdvisorConfig) -> Option<Arc<dyn LlmProvider>> {
    let key = config.explanation.api_key.as_ref()?;
    let mut gemini = GeminiConfig::new(key.clone()).with_timeout(config.explanation.timeout_secs);
    if let Some(base_url) = &config.explanation.base_url {
        gemini = gemini.with_base_url(base_url.clone());
    }

    match GeminiProvider::new(gemini) {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            tracing::warn!("⚠ Gemini client could not be created: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = Arc::new(AdvisorConfig::from_env());

    // Market data
    let market = market_provider(&config)?;
    tracing::info!("✓ Market data source: {}", market.name());

    // Explanation provider
    let explainer = explanation_provider(&config);
    if explainer.is_some() {
        tracing::info!("✓ Gemini configured (model {})", config.explanation.model);
    } else {
        tracing::warn!("⚠ GEMINI_API_KEY not set - explanations use offline text");
    }

    if config.crew.is_some() {
        tracing::info!("✓ Crew credentials configured");
    } else {
        tracing::info!("Crew credentials not set - deterministic pipeline only");
    }

    let state = AppState {
        config,
        market,
        explainer,
    };

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 portfolio advisor running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health         - Health check");
    tracing::info!("  GET  /api/universe   - Default ticker universe");
    tracing::info!("  POST /api/recommend  - Portfolio recommendation");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
