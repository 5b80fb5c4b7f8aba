//! Remote-provider dispatch for `"api"` mode: calls the contextual embedder and the
//! cross-encoder reranker over HTTP, wrapped in the same circuit-breaker / rate-limit /
//! retry machinery used by every provider call the gateway makes.

use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerManager;
use crate::normalize::l2_normalize_in_place;
use crate::rate_limit::{RateLimitManager, TokenBucket};
use crate::retry::execute_with_retry_async;
use crate::types::{Embedding, RerankedPassage};
use crate::{EmbeddingConfig, EmbeddingError, EMBEDDING_DIM};

static CIRCUIT_BREAKER_MANAGER: Lazy<CircuitBreakerManager> = Lazy::new(CircuitBreakerManager::default);
static RATE_LIMIT_MANAGER: Lazy<RateLimitManager> = Lazy::new(RateLimitManager::default);

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(32)
        .build()
        .expect("failed to build embedding gateway HTTP client")
});

fn provider_name(cfg: &EmbeddingConfig) -> String {
    cfg.api_provider.as_deref().unwrap_or("custom").to_ascii_lowercase()
}

fn rate_limiter(cfg: &EmbeddingConfig, provider: &str) -> std::sync::Arc<TokenBucket> {
    match cfg.rate_limit_config {
        Some(config) => RATE_LIMIT_MANAGER.get_or_create_with_config(provider, config),
        None => RATE_LIMIT_MANAGER.get_or_create(provider),
    }
}

/// Runs `send` through the circuit breaker, rate limiter, and retry policy shared by every
/// provider call. Failures that exhaust retries surface as [`EmbeddingError::ProviderError`];
/// a closed-circuit or empty-bucket rejection surfaces as [`EmbeddingError::RateLimited`] so
/// the caller (the orchestrator), not the gateway, decides whether to back off.
async fn call_provider<F, Fut>(
    cfg: &EmbeddingConfig,
    provider: &str,
    send: F,
) -> Result<Value, EmbeddingError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Value, String>>,
{
    if !cfg.enable_resilience {
        return send().await.map_err(EmbeddingError::ProviderError);
    }

    let breaker = CIRCUIT_BREAKER_MANAGER.get_or_create(provider);
    if !breaker.allow_request() {
        return Err(EmbeddingError::RateLimited(format!(
            "circuit open for provider '{provider}'"
        )));
    }
    if !rate_limiter(cfg, provider).acquire() {
        return Err(EmbeddingError::RateLimited(format!(
            "rate limit exceeded for provider '{provider}'"
        )));
    }

    let retry_cfg = cfg.retry_config.unwrap_or_default();
    let result = execute_with_retry_async(&retry_cfg, |_attempt| send()).await;

    match result.into_result() {
        Ok(value) => {
            breaker.record_success();
            Ok(value)
        }
        Err(e) => {
            breaker.record_failure();
            Err(EmbeddingError::ProviderError(e))
        }
    }
}

async fn send_json(url: &str, cfg: &EmbeddingConfig, payload: Value) -> Result<Value, String> {
    let mut request = HTTP_CLIENT.post(url).json(&payload).timeout(cfg.api_timeout());
    if let Some(auth) = &cfg.api_auth_header {
        request = request.header("Authorization", auth);
    }

    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    let body: Value = response.json().await.map_err(|e| e.to_string())?;

    if status.as_u16() == 429 {
        return Err(format!("rate limited: {status}"));
    }
    if !status.is_success() {
        return Err(format!("provider returned {status}: {body}"));
    }
    Ok(body)
}

fn parse_vectors(body: &Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let array = body
        .as_array()
        .or_else(|| body.get("embeddings").and_then(|v| v.as_array()))
        .or_else(|| body.get("data").and_then(|v| v.as_array()))
        .ok_or_else(|| EmbeddingError::ProviderError("response had no embedding array".into()))?;

    array
        .iter()
        .map(|entry| {
            let vec = entry
                .as_array()
                .or_else(|| entry.get("embedding").and_then(|v| v.as_array()))
                .ok_or_else(|| EmbeddingError::ProviderError("malformed embedding entry".into()))?;
            vec.iter()
                .map(|v| {
                    v.as_f64().map(|f| f as f32).ok_or_else(|| {
                        EmbeddingError::ProviderError("embedding entry was not numeric".into())
                    })
                })
                .collect::<Result<Vec<f32>, _>>()
        })
        .collect()
}

/// Calls `embed_contextual` against the configured API provider, one structural-label-wrapped
/// unit per input, returning one [`Embedding`] per input in order.
pub(crate) async fn embed_contextual_via_api(
    ids: &[String],
    wrapped_texts: &[String],
    cfg: &EmbeddingConfig,
) -> Result<Vec<Embedding>, EmbeddingError> {
    let url = cfg
        .api_url
        .as_deref()
        .ok_or_else(|| EmbeddingError::InvalidConfig("api_url is required for api mode".into()))?;
    let provider = provider_name(cfg);

    let payload = json!({ "model": cfg.model_name, "input": wrapped_texts });
    let body = call_provider(cfg, &provider, || send_json(url, cfg, payload.clone())).await?;
    let vectors = parse_vectors(&body)?;

    if vectors.len() != ids.len() {
        return Err(EmbeddingError::ProviderError(format!(
            "provider returned {} embeddings for {} inputs",
            vectors.len(),
            ids.len()
        )));
    }

    vectors
        .into_iter()
        .zip(ids.iter())
        .map(|(mut vector, id)| {
            if vector.len() != EMBEDDING_DIM {
                return Err(EmbeddingError::InvalidModel(format!(
                    "provider returned {}-dim vector, expected {EMBEDDING_DIM}",
                    vector.len()
                )));
            }
            if cfg.normalize {
                l2_normalize_in_place(&mut vector);
            }
            Ok(Embedding {
                id: id.clone(),
                vector,
                model_name: cfg.model_name.clone(),
                normalized: cfg.normalize,
            })
        })
        .collect()
}

/// Calls the cross-encoder rerank endpoint, scoring every passage jointly against `query`.
pub(crate) async fn rerank_via_api(
    query: &str,
    passages: &[(String, String)],
    cfg: &EmbeddingConfig,
) -> Result<Vec<RerankedPassage>, EmbeddingError> {
    let url = cfg
        .api_url
        .as_deref()
        .ok_or_else(|| EmbeddingError::InvalidConfig("api_url is required for api mode".into()))?;
    let provider = provider_name(cfg);
    let model = cfg.rerank_model_name.as_deref().unwrap_or(&cfg.model_name);

    let documents: Vec<&str> = passages.iter().map(|(_, text)| text.as_str()).collect();
    let payload = json!({ "model": model, "query": query, "documents": documents });
    let body = call_provider(cfg, &provider, || send_json(url, cfg, payload.clone())).await?;

    let results = body
        .get("results")
        .and_then(|v| v.as_array())
        .ok_or_else(|| EmbeddingError::ProviderError("rerank response had no results array".into()))?;

    let mut scores = vec![0f32; passages.len()];
    for entry in results {
        let index = entry
            .get("index")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| EmbeddingError::ProviderError("rerank entry missing index".into()))?
            as usize;
        let score = entry
            .get("relevance_score")
            .or_else(|| entry.get("score"))
            .and_then(|v| v.as_f64())
            .ok_or_else(|| EmbeddingError::ProviderError("rerank entry missing score".into()))?
            as f32;
        if index >= scores.len() {
            return Err(EmbeddingError::ProviderError(format!(
                "rerank index {index} out of range for {} passages",
                passages.len()
            )));
        }
        scores[index] = score;
    }

    let mut ranked: Vec<RerankedPassage> = passages
        .iter()
        .zip(scores)
        .map(|((id, _), score)| RerankedPassage {
            passage_id: id.clone(),
            score,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(ranked)
}
