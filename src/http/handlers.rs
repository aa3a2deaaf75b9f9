//! HTTP request handlers
//!
//! Small JSON endpoints; playback and uploads live in `socket` and `upload`.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::sign::SpeedSummary;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version information endpoint
pub async fn version_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Speed derived from a slider value, clamped to the configured range
pub async fn speed_info(
    State(state): State<Arc<AppState>>,
    Path(value): Path<u32>,
) -> Json<SpeedSummary> {
    Json(state.speed_range.clamp(value).summary())
}

/// Live session listing
pub async fn debug_sessions(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "live": state.sessions.len(),
        "opened": state.sessions_opened.load(Ordering::Relaxed),
        "sessions": state.session_snapshots(),
    }))
}
