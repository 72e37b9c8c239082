//! HTTP API gateway for Anxiousroid.
//!
//! Exposes the chat endpoint consumed by the messaging front ends and a
//! health check.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use anxiousroid_agent::ResponsePipeline;
use anxiousroid_catalog::{CatalogSource, RuleIndex, TermIndex};
use anxiousroid_config::AppConfig;
use anxiousroid_core::error::CatalogError;
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<ResponsePipeline>,
}

pub type SharedState = Arc<GatewayState>;

/// Request body size limit (1 MB).
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(api::CHAT_PATH, post(api::chat_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Load both catalogs eagerly so a broken file fails startup rather than the
/// first chat request.
pub fn load_catalogs(config: &AppConfig) -> Result<(Arc<TermIndex>, Arc<RuleIndex>), CatalogError> {
    let terms = TermIndex::new(CatalogSource::file(&config.catalog.terminology_path));
    let rules = RuleIndex::new(CatalogSource::file(&config.catalog.additional_rules_path));
    let term_count = terms.preload()?;
    let rule_count = rules.preload()?;
    info!(terms = term_count, rules = rule_count, "Catalogs ready");
    Ok((Arc::new(terms), Arc::new(rules)))
}

/// Build the chat pipeline: catalogs, provider and conversation store.
pub fn build_pipeline(config: &AppConfig) -> Result<ResponsePipeline, Box<dyn std::error::Error>> {
    let (terms, rules) = load_catalogs(config)?;
    let provider = anxiousroid_providers::build_from_config(config)?;
    let store = anxiousroid_memory::build_from_config(&config.conversation);
    info!(store = store.name(), "Conversation store ready");
    Ok(ResponsePipeline::from_config(
        config, provider, store, terms, rules,
    ))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let pipeline = Arc::new(build_pipeline(&config)?);
    let app = build_router(Arc::new(GatewayState { pipeline }));

    info!(addr = %addr, model = %config.model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
