//! HTTP gateway for Switchboard.
//!
//! Exposes the orchestrator over REST so chat frontends can hold
//! multi-turn clarification dialogues.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/v1/query` - Process one conversation turn
//! - `POST /api/v1/reset` - Drop a conversation's session
//!
//! # Architecture
//!
//! ```text
//! Client (chat frontend)
//!    │
//!    ▼
//! ┌─────────────────┐
//! │   API Gateway   │ ◄── This crate
//! │     (Axum)      │
//! └────────┬────────┘
//!          │  one Orchestrator per conversation_id
//!          ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │  Orchestrator   │ ──► │  Domain agents  │
//! │  (clarification │     │ (GitHub/Linear) │
//! │   state machine)│     └─────────────────┘
//! └─────────────────┘
//! ```

pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use state::AppState;

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/query", post(routes::query))
        .route("/api/v1/reset", post(routes::reset))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the given address.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let router = create_router(state);

    info!(%addr, "Starting Switchboard API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
