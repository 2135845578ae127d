//! Workflow assembly and the HTTP run loop

use super::config::AppConfig;
use super::loader::load_config;
use super::providers::resolve_llm_provider;
use crate::api::{self, AppState};
use anyhow::{Context, Result};
use quorum_core::{llm_workflow, EventBus, QueryWorkflow, WorkflowEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Assemble the LLM-backed workflow described by `config`
pub fn build_workflow(config: &AppConfig) -> Result<QueryWorkflow> {
    let provider = resolve_llm_provider(&config.llm)?;
    llm_workflow(provider, &config.llm.settings())
        .config(config.workflow.clone())
        .event_bus(EventBus::default())
        .build()
        .context("Failed to assemble workflow")
}

/// Forward workflow events to the log
fn spawn_event_logger(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(WorkflowEvent::CapReached { request_id, visits }) => {
                    warn!(request_id = %request_id, visits, "Run hit the visit cap");
                }
                Ok(event) => debug!(?event, "Workflow event"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagging");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn run() -> Result<()> {
    info!("Starting Quorum v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let workflow = build_workflow(&config)?;
    spawn_event_logger(workflow.events());

    let state = AppState {
        workflow: Arc::new(workflow),
    };
    let mut app = api::router(state).layer(TraceLayer::new_for_http());
    if config.server.cors {
        app = app.layer(CorsLayer::permissive());
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Quorum shutdown complete");
    Ok(())
}
