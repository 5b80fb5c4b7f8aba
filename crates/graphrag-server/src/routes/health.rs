use crate::error::ServerResult;
use crate::state::{ServerMetadata, ServerState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> = once_cell::sync::Lazy::new(SystemTime::now);

/// Health check endpoint (liveness). Returns 200 if server is running.
pub async fn health_check() -> impl IntoResponse {
    let uptime = SERVER_START_TIME.elapsed().map(|d| d.as_secs()).unwrap_or(0);

    Json(json!({
        "status": "healthy",
        "service": "graphrag-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
    }))
}

/// Readiness check endpoint. Returns 200 if the graph store is reachable.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let graph_status = match state.graph.scan_nodes("__readiness_probe__") {
        Ok(_) => "ready",
        Err(_) => "degraded",
    };

    let uptime = SERVER_START_TIME.elapsed().map(|d| d.as_secs()).unwrap_or(0);

    Ok(Json(json!({
        "status": "ready",
        "service": "graphrag-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "components": {
            "api": "ready",
            "graph_store": graph_status,
        }
    })))
}

/// Prometheus-style metrics endpoint.
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "uptime_seconds": SERVER_START_TIME.elapsed().map(|d| d.as_secs()).unwrap_or(0),
        "rate_limit_per_minute": state.config.rate_limit_per_minute,
    })))
}

/// Server metadata endpoint (authenticated).
pub async fn server_metadata(State(_state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let uptime = SERVER_START_TIME.elapsed().map(|d| d.as_secs()).unwrap_or(0);

    let metadata = ServerMetadata { version: env!("CARGO_PKG_VERSION").to_string(), uptime_seconds: uptime };

    Ok(Json(serde_json::to_value(metadata)?))
}
