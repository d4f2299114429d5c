use super::state::AppState;
use crate::call::SetupRequest;
use crate::session::SessionSummary;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SetUpCallResponse {
    pub message: String,
    pub bridge_id: String,
    pub channels: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Number of the setup step that failed, if any
    pub step: Option<u8>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /set_up_call
/// Bridge a Stasis channel to a local media listener
pub async fn set_up_call(
    State(state): State<AppState>,
    Json(req): Json<SetupRequest>,
) -> impl IntoResponse {
    info!("Received a request to set up a call: {:?}", req);

    match state.sequencer.set_up_call(&req.channel_id, req.port).await {
        Ok(topology) => {
            info!(
                "Call for channel {} bridged in {}",
                req.channel_id, topology.bridge_id
            );
            (
                StatusCode::OK,
                Json(SetUpCallResponse {
                    message: format!("Call {} set up on port {}", req.channel_id, req.port),
                    bridge_id: topology.bridge_id,
                    channels: topology.channel_ids,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to set up call {}: {}", req.channel_id, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                    step: e.setup_step().map(|step| step.number()),
                }),
            )
                .into_response()
        }
    }
}

/// GET /sessions
/// List live call sessions
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions: Vec<SessionSummary> = state.sessions.snapshot().await;
    (StatusCode::OK, Json(sessions))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
