//! Question answering endpoint

use super::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use quorum_core::{HistoryEntry, QueryOutcome, ResponderId, Topic, UserFriendlyError};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Request body
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Successful answer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub query: String,
    pub response: String,
    pub topic: Option<Topic>,
    pub agents_consulted: Vec<ResponderId>,
    pub history: Vec<HistoryEntry>,
    pub request_id: String,
    pub cap_reached: bool,
}

impl QueryResponse {
    pub fn new(query: &str, outcome: QueryOutcome) -> Self {
        Self {
            query: query.to_string(),
            response: outcome.response,
            topic: outcome.topic,
            agents_consulted: outcome.agents_consulted,
            history: outcome.history,
            request_id: outcome.request_id.to_string(),
            cap_reached: outcome.cap_reached,
        }
    }
}

/// Error body; never carries internal detail
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn answer_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    // malformed bodies get the same JSON error as a missing query
    let query = match body {
        Ok(Json(body)) => body.query.unwrap_or_default(),
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Rejected query body");
            String::new()
        }
    };
    let query = query.trim();
    if query.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query is required");
    }

    // a dropped request (client gone) cancels the run
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match state.workflow.answer(query, &cancel).await {
        Ok(outcome) => {
            info!(request_id = %outcome.request_id, "Query answered");
            Json(QueryResponse::new(query, outcome)).into_response()
        }
        Err(e) => {
            error!(node = ?e.node(), error = %e, "Query failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.user_message())
        }
    }
}

/// Query routes
pub fn query_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/query", post(answer_query))
        .with_state(state)
}
