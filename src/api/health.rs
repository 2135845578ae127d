//! Health check endpoint

use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes
pub fn health_routes() -> Router {
    Router::new().route("/api/health", get(health))
}
