use super::state::AppState;
use crate::relay;
use axum::{
    extract::{State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::atomic::Ordering;
use tracing::warn;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_connections: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /ws/transcribe
/// Upgrade to the transcription relay WebSocket
pub async fn transcribe(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let active = state.active_connections.load(Ordering::SeqCst);
    if active >= state.config.relay.max_connections {
        warn!("Rejecting connection: {} sessions already active", active);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Too many active transcription sessions".to_string(),
            }),
        )
            .into_response();
    }

    ws.on_upgrade(move |socket| async move {
        state.active_connections.fetch_add(1, Ordering::SeqCst);
        relay::serve_connection(socket, state.config.clone()).await;
        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    })
    .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_connections: state.active_connections.load(Ordering::SeqCst),
    })
}
