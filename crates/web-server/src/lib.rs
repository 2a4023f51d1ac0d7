//! # FarmTech Dashboard
//!
//! A read-only JSON API over the farm records: producers and their areas, area
//! sensors and readings, crops, and a per-area summary with the humidity forecast.

use axum::{routing::get, Router};
use chrono::Duration;
use database::FarmRepository;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod extract;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn FarmRepository>,
    /// Default forecast horizon when a request does not name one.
    pub horizon: Duration,
}

impl AppState {
    pub fn new(repo: Arc<dyn FarmRepository>, horizon: Duration) -> Self {
        Self { repo, horizon }
    }
}

/// Builds the router with its middleware. Used by `run_server` and by the tests.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/producers", get(handlers::list_producers))
        .route("/api/producers/:id/areas", get(handlers::producer_areas))
        .route("/api/areas/:id", get(handlers::area_details))
        .route("/api/areas/:id/summary", get(handlers::area_summary))
        .route("/api/areas/:id/forecast", get(handlers::area_forecast))
        .route("/api/crops", get(handlers::list_crops))
        .route("/api/sensors/:id/readings", get(handlers::sensor_readings))
        .with_state(Arc::new(state))
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves the dashboard until the process is stopped.
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
