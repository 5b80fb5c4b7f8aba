//! Drives the Axum router directly via `tower::ServiceExt::oneshot`,
//! without binding a socket, so the suite stays hermetic (§15.4).

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use server::state::ServerState;
use server::{server::build_router, ServerConfig};
use tower::ServiceExt;

fn test_state() -> Arc<ServerState> {
    let config = ServerConfig { api_keys: std::collections::HashSet::from(["test-key".to_string()]), ..Default::default() };
    Arc::new(ServerState::new(config).unwrap())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn chat_body(query: &str) -> String {
    json!({"messages": [{"role": "user", "content": query}]}).to_string()
}

#[tokio::test]
async fn health_check_is_public() {
    let router = build_router(test_state());
    let response = router.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_without_api_key_is_unauthenticated() {
    let router = build_router(test_state());
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .header("X-Group-ID", "tenant-a")
        .body(Body::from(chat_body("What was the invoice total?")))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chat_without_group_id_is_rejected() {
    let router = build_router(test_state());
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .header("X-API-Key", "test-key")
        .body(Body::from(chat_body("What was the invoice total?")))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_against_an_empty_corpus_returns_an_empty_answer_without_crashing() {
    // §8's "empty corpus" boundary behaviour: no indexed nodes for this
    // group, the route still returns 200 with empty evidence.
    let router = build_router(test_state());
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .header("X-API-Key", "test-key")
        .header("X-Group-ID", "empty-tenant")
        .body(Body::from(chat_body("What was the invoice total?")))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.get("message").is_some());
    assert_eq!(body.get("route_used").and_then(Value::as_str), Some("route_2"));
}

#[tokio::test]
async fn unknown_route_returns_not_found() {
    let router = build_router(test_state());
    let response = router.oneshot(Request::builder().uri("/does-not-exist").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
