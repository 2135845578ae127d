//! Web API module for Quorum
//!
//! - `POST /api/query`: answer a question
//! - `GET /api/health`: liveness and version

pub mod health;
pub mod query;

use axum::Router;
use quorum_core::QueryWorkflow;
use std::sync::Arc;

pub use health::health_routes;
pub use query::{query_routes, QueryResponse};

/// State shared by the handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<QueryWorkflow>,
}

/// Create the API router with all endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(query_routes(state))
}
