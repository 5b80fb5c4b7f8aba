//! API route handlers
//!
//! - `health`: Health checks, readiness, and metrics
//! - `chat`: `/chat`, `/chat/stream`, `/chat/status/{job_id}` — the
//!   retrieval gateway endpoints (§6)

pub mod chat;
pub mod health;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info. Root endpoint (GET /), no authentication.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "GraphRAG Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/chat",
            "/chat/stream",
            "/chat/status/{job_id}",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
