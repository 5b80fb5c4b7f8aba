use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::rate_limit::RateLimitConfig;
use crate::retry::RetryConfig;

/// Runtime configuration for the embedding gateway.
///
/// # Example
/// ```no_run
/// use graphrag_embedding::{EmbeddingGateway, EmbeddingConfig};
///
/// let cfg = EmbeddingConfig {
///     mode: "api".into(),
///     api_url: Some("https://api-inference.huggingface.co/models/BAAI/bge-large-en-v1.5".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     api_provider: Some("hf".into()),
///     ..Default::default()
/// };
/// let gateway = EmbeddingGateway::new(cfg);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Inference mode selector: `"onnx"` (local), `"api"` (remote HTTP), or `"stub"` (deterministic,
    /// used in tests and as a fallback for local development).
    pub mode: String,
    /// Friendly label surfaced on every [`crate::Embedding`].
    pub model_name: String,
    /// Local path where the ONNX file should live (also used as the download target when
    /// [`model_url`](Self::model_url) is provided).
    pub model_path: PathBuf,
    /// Optional HTTPS/S3 URL that will be downloaded when [`model_path`](Self::model_path) is missing.
    pub model_url: Option<String>,
    /// API inference endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Path to `tokenizer.json`. When absent and [`tokenizer_url`](Self::tokenizer_url) is provided we
    /// infer the filename from the URL and place it next to the model file.
    pub tokenizer_path: Option<PathBuf>,
    /// Optional HTTPS/S3 URL for fetching the tokenizer on-demand.
    pub tokenizer_url: Option<String>,
    /// Normalize the resulting vector to unit-length (required for cosine similarity search).
    pub normalize: bool,
    /// Maximum token sequence length accepted by the model before chunking kicks in.
    pub max_sequence_length: usize,
    /// Whether texts longer than `max_sequence_length` are split into overlapping windows and
    /// pooled, rather than truncated.
    pub enable_chunking: bool,
    /// Overlap ratio between adjacent chunks (0.0-1.0).
    pub chunk_overlap_ratio: f32,
    /// Pooling strategy for chunked embeddings: `"mean"`, `"max"`, `"first"`, or `"weighted"`.
    pub pooling_strategy: String,
    /// Whether the cross-encoder reranker is consulted during [`crate::EmbeddingGateway::rerank`].
    /// Disabled by default: the reranker adds a second provider round-trip per Route 2 query and
    /// current evaluations have not shown enough of a retrieval-quality gain to justify it by
    /// default. See DESIGN.md for the corresponding open-question decision.
    pub rerank_enabled: bool,
    /// Model name used for the cross-encoder rerank endpoint, if different from `model_name`.
    pub rerank_model_name: Option<String>,
    /// Whether retry/circuit-breaker/rate-limit machinery wraps provider calls. Disabled in
    /// deterministic tests so stub-mode assertions aren't subject to jitter.
    pub enable_resilience: bool,
    pub retry_config: Option<RetryConfig>,
    pub circuit_breaker_config: Option<CircuitBreakerConfig>,
    pub rate_limit_config: Option<RateLimitConfig>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: "stub".into(),
            model_name: "bge-large-en-v1.5".into(),
            model_path: PathBuf::from("./models/bge-large-en-v1.5/onnx/model.onnx"),
            model_url: None,
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            tokenizer_path: Some(PathBuf::from("./models/bge-large-en-v1.5/tokenizer.json")),
            tokenizer_url: None,
            normalize: true,
            max_sequence_length: 512,
            enable_chunking: true,
            chunk_overlap_ratio: 0.1,
            pooling_strategy: "mean".into(),
            rerank_enabled: false,
            rerank_model_name: None,
            enable_resilience: true,
            retry_config: None,
            circuit_breaker_config: None,
            rate_limit_config: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs.unwrap_or(30))
    }
}
