//! HTTP route handlers for the API.

use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub llm_enabled: bool,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        llm_enabled: state.llm_enabled,
    })
}

/// Query request body.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Query response body.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub conversation_id: String,
    pub response: String,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip)]
    status: StatusCode,
}

impl ErrorResponse {
    fn bad_request(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            status: StatusCode::BAD_REQUEST,
        }
    }

    fn internal(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Process one conversation turn.
///
/// A missing or blank `conversation_id` starts a fresh session under a
/// generated UUID; the id is echoed back so the client can continue the
/// dialogue (clarification answers go to the same id).
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ErrorResponse> {
    if request.query.trim().is_empty() {
        return Err(ErrorResponse::bad_request(
            "Query must not be empty",
            "EMPTY_QUERY",
        ));
    }

    let conversation_id = request
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(
        conversation_id = %conversation_id,
        query_preview = %request.query.chars().take(50).collect::<String>(),
        "Received query"
    );

    let orchestrator = state.conversation(&conversation_id).await;
    let mut orchestrator = orchestrator.lock().await;

    let response = orchestrator.process_query(&request.query).await.map_err(|e| {
        error!(conversation_id = %conversation_id, error = %e, "Query processing failed");
        ErrorResponse::internal(format!("Query processing failed: {e}"), "QUERY_ERROR")
    })?;

    Ok(Json(QueryResponse {
        conversation_id,
        response,
    }))
}

/// Reset request body.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub conversation_id: String,
}

/// Reset response body.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub conversation_id: String,
    pub cleared: bool,
}

/// Drop a conversation's session, pending clarification included.
pub async fn reset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetRequest>,
) -> Json<ResetResponse> {
    let cleared = state.remove_conversation(&request.conversation_id).await;
    info!(
        conversation_id = %request.conversation_id,
        cleared,
        "Conversation reset"
    );

    Json(ResetResponse {
        conversation_id: request.conversation_id,
        cleared,
    })
}
