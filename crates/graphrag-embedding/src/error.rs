use std::io;
use thiserror::Error;

/// Errors surfaced by the embedding gateway (`embed_contextual`, `embed_query`, `rerank`).
///
/// None of these are silently swallowed: a missing model or tokenizer is
/// [`EmbeddingError::InvalidModel`] and is never retried, a provider rejecting a request with a
/// 429-class response is [`EmbeddingError::RateLimited`] (retried by the caller, not the gateway),
/// and anything else that survives retry exhaustion bubbles up as [`EmbeddingError::ProviderError`].
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The configured model/tokenizer assets could not be resolved, or the model produced a
    /// vector whose dimensionality does not match [`crate::EMBEDDING_DIM`]. Never retried.
    #[error("invalid model configuration: {0}")]
    InvalidModel(String),
    /// Configuration is inconsistent (e.g. api mode without an api_url).
    #[error("invalid embedding gateway config: {0}")]
    InvalidConfig(String),
    /// The provider rejected the request with a 429-class response.
    #[error("rate limited by provider: {0}")]
    RateLimited(String),
    /// Circuit breaker is open, or the provider returned an error after retries were exhausted.
    #[error("provider error: {0}")]
    ProviderError(String),
    /// Low-level IO failures while touching the filesystem (asset download/load).
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Clone for EmbeddingError {
    fn clone(&self) -> Self {
        match self {
            EmbeddingError::InvalidModel(s) => EmbeddingError::InvalidModel(s.clone()),
            EmbeddingError::InvalidConfig(s) => EmbeddingError::InvalidConfig(s.clone()),
            EmbeddingError::RateLimited(s) => EmbeddingError::RateLimited(s.clone()),
            EmbeddingError::ProviderError(s) => EmbeddingError::ProviderError(s.clone()),
            EmbeddingError::Io(_) => EmbeddingError::ProviderError("io error occurred".to_string()),
        }
    }
}
