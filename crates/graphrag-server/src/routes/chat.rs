//! The retrieval gateway endpoints (§6): `POST /chat`, `POST /chat/stream`,
//! `GET /chat/status/{job_id}`. Route 2 (p95 ~3s) runs synchronously inside
//! the HTTP handler; Routes 3/4/5 are enqueued on [`crate::jobs::JobQueue`]
//! and the caller polls or streams progress (§5's sync-vs-async dispatch).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderValue;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use graphrag_retrieval::orchestrator::{Answer, Orchestrator};
use graphrag_retrieval::types::{QueryOptions, RouteKind};

use crate::error::{ServerError, ServerResult};
use crate::middleware::{ALGORITHM_VERSION_USED_HEADER, GroupId};
use crate::state::ServerState;

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ChatRequestContext {
    pub route_preference: Option<String>,
    pub algorithm_version: Option<String>,
    pub group_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub context: ChatRequestContext,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseContext {
    pub data_points: Vec<String>,
    pub thoughts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub context: ChatResponseContext,
    pub route_used: String,
    pub algorithm_version_used: String,
}

#[derive(Debug, Serialize)]
pub struct JobAcceptedResponse {
    pub job_id: String,
    pub status: &'static str,
}

/// Pulls the user's latest turn out of the chat-history array. Only the
/// last message is ever sent to NER or the routes (§4.3: "NER the original
/// query, never decomposed sub-questions" generalizes to "never prior
/// turns" — history is conversational context the caller already has, not
/// additional retrieval surface).
fn last_user_query(messages: &[ChatMessage]) -> Result<&str, ServerError> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .filter(|q| q.trim().chars().count() >= 3)
        .ok_or_else(|| ServerError::InvalidRequest("query must be at least 3 characters".to_string()))
}

fn route_preference(pref: Option<&str>) -> Option<RouteKind> {
    match pref {
        Some("route_2") | Some("local") => Some(RouteKind::Local),
        Some("route_3") | Some("global") => Some(RouteKind::Global),
        Some("route_4") | Some("drift") => Some(RouteKind::Drift),
        Some("route_5") | Some("unified") => Some(RouteKind::Unified),
        _ => None,
    }
}

fn route_label(route: RouteKind) -> &'static str {
    match route {
        RouteKind::Local => "route_2",
        RouteKind::Global => "route_3",
        RouteKind::Drift => "route_4",
        RouteKind::Unified => "route_5",
    }
}

/// Attaches the `X-Algorithm-Version-Used` header (§9) so callers can tell
/// which frozen route snapshot actually served the request, independent of
/// whatever they requested in `context.algorithm_version`.
fn with_algorithm_version_header(response: impl IntoResponse, version: &str) -> impl IntoResponse {
    let mut response = response.into_response();
    if let Ok(value) = HeaderValue::from_str(version) {
        response.headers_mut().insert(ALGORITHM_VERSION_USED_HEADER, value);
    }
    response
}

fn answer_to_response(answer: Answer, algorithm_version_used: String) -> ChatResponse {
    let data_points = answer.citations.iter().map(|c| c.node_id.clone()).collect();
    let thoughts = vec![format!(
        "classified as {:?}, routed to {}, confidence {:.2} over {} attempt(s)",
        answer.intent,
        route_label(answer.route),
        answer.confidence,
        answer.attempts
    )];

    ChatResponse {
        message: answer.text,
        context: ChatResponseContext { data_points, thoughts, error_kind: None },
        route_used: route_label(answer.route).to_string(),
        algorithm_version_used,
    }
}

/// `POST /chat`. Route 2 runs inline; anything else is enqueued and the
/// caller is told to poll `/chat/status/{job_id}` instead (§5, §14).
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    group_id: axum::extract::Extension<GroupId>,
    Json(request): Json<ChatRequest>,
) -> ServerResult<impl IntoResponse> {
    let query = last_user_query(&request.messages)?;
    let group_id = &group_id.0 .0;

    if let Some(requested) = &request.context.algorithm_version {
        if !state.config.algorithm_v2_enabled && requested != "route2-only" {
            return Err(ServerError::DeprecatedVersion(requested.clone()));
        }
    }
    let algorithm_version_used = state.algorithm_version_used(request.context.algorithm_version.as_deref());

    let force_route = route_preference(request.context.route_preference.as_deref());
    let resolved_route = force_route.unwrap_or_else(|| {
        graphrag_retrieval::classify::default_route_for_intent(graphrag_retrieval::classify::classify_intent(query))
    });

    if resolved_route == RouteKind::Local {
        let options = QueryOptions { force_route, ..Default::default() };
        let orchestrator = Orchestrator::new(&state.graph, &state.embeddings, state.entity_extractor.as_ref(), state.synthesizer.as_ref());
        let answer = orchestrator.answer(query, group_id, options).await?;
        let response = Json(answer_to_response(answer, algorithm_version_used.clone()));
        return Ok(with_algorithm_version_header(response, &algorithm_version_used).into_response());
    }

    let job_id = state.jobs.submit();
    spawn_job(state.clone(), job_id, query.to_string(), group_id.clone(), force_route);
    let response = (axum::http::StatusCode::ACCEPTED, Json(JobAcceptedResponse { job_id: job_id.to_string(), status: "accepted" }));
    Ok(with_algorithm_version_header(response, &algorithm_version_used).into_response())
}

/// `POST /chat/stream`. Same dispatch as `chat`, but progress ("thoughts")
/// and the final answer are delivered as newline-delimited JSON events.
/// Implemented over SSE framing so axum handles chunked transfer for us;
/// the wire payload per event is still a bare JSON object per line.
pub async fn chat_stream(
    State(state): State<Arc<ServerState>>,
    group_id: axum::extract::Extension<GroupId>,
    Json(request): Json<ChatRequest>,
) -> ServerResult<impl IntoResponse> {
    let query = last_user_query(&request.messages)?.to_string();
    let group_id = group_id.0 .0.clone();
    let force_route = route_preference(request.context.route_preference.as_deref());
    let algorithm_version_used = state.algorithm_version_used(request.context.algorithm_version.as_deref());

    let options = QueryOptions { force_route, ..Default::default() };
    let orchestrator_state = state.clone();
    let result = {
        let orchestrator = Orchestrator::new(
            &orchestrator_state.graph,
            &orchestrator_state.embeddings,
            orchestrator_state.entity_extractor.as_ref(),
            orchestrator_state.synthesizer.as_ref(),
        );
        orchestrator.answer(&query, &group_id, options).await
    };

    let events: Vec<Result<Event, std::convert::Infallible>> = match result {
        Ok(answer) => {
            let response = answer_to_response(answer, algorithm_version_used);
            let delta = serde_json::json!({
                "delta": { "content": response.message },
                "context": { "thoughts": response.context.thoughts, "data_points": response.context.data_points },
                "route_used": response.route_used,
                "algorithm_version_used": response.algorithm_version_used,
            });
            vec![Ok(Event::default().data(delta.to_string()))]
        }
        Err(err) => {
            let failure = serde_json::json!({
                "delta": { "content": "" },
                "context": { "thoughts": vec![err.to_string()], "error_kind": error_kind_label(&err) },
            });
            vec![Ok(Event::default().data(failure.to_string()))]
        }
    };

    let stream: std::pin::Pin<Box<dyn Stream<Item = Result<Event, std::convert::Infallible>> + Send>> =
        Box::pin(stream::iter(events));
    Ok(with_algorithm_version_header(Sse::new(stream), &algorithm_version_used))
}

/// `GET /chat/status/{job_id}`.
pub async fn chat_status(
    State(state): State<Arc<ServerState>>,
    Path(job_id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let id = Uuid::parse_str(&job_id).map_err(|_| ServerError::InvalidRequest(format!("malformed job id {job_id}")))?;
    let (status, progress, result, error) = state
        .jobs
        .status(id)
        .ok_or_else(|| ServerError::JobNotFound(job_id.clone()))?;

    Ok(Json(serde_json::json!({
        "status": status,
        "progress": progress,
        "result": result,
        "error": error,
    })))
}

fn spawn_job(state: Arc<ServerState>, job_id: Uuid, query: String, group_id: String, force_route: Option<RouteKind>) {
    tokio::spawn(async move {
        if !state.jobs.claim(job_id) {
            return;
        }
        state.jobs.record_thought(job_id, format!("classifying and routing query for group {group_id}"));

        let options = QueryOptions { force_route, ..Default::default() };
        let orchestrator = Orchestrator::new(&state.graph, &state.embeddings, state.entity_extractor.as_ref(), state.synthesizer.as_ref());
        match orchestrator.answer(&query, &group_id, options).await {
            Ok(answer) => {
                state.jobs.record_thought(job_id, format!("synthesised via {}", route_label(answer.route)));
                state.jobs.complete(job_id, answer);
            }
            Err(err) => {
                state.jobs.record_thought(job_id, format!("stage failed: {err}"));
                state.jobs.fail(job_id, err.to_string());
            }
        }
    });
}

fn error_kind_label(err: &graphrag_retrieval::RetrievalError) -> &'static str {
    use graphrag_retrieval::RetrievalError::*;
    match err {
        Graph(_) => "GraphError",
        Embedding(_) => "ProviderError",
        EmptySeedSet(_) => "EmptySeedSet",
        Cancelled => "Cancelled",
        Synthesis(_) => "ProviderError",
    }
}
