//! Embedding Gateway (§4.1).
//!
//! Wraps two external embedding services behind one provider-agnostic contract: a
//! contextualised document embedder (fixed at [`EMBEDDING_DIM`] dimensions) and a
//! cross-encoder reranker. Three dispatch modes share the contract:
//!
//! - **`"api"`** — calls a remote HTTP provider (the production path).
//! - **`"onnx"`** — runs a local ONNX model + tokenizer, for self-hosted or offline use.
//! - **`"stub"`** — deterministic, hash-derived vectors; used in tests and as the
//!   automatic fallback when local model assets are missing.
//!
//! Every unit submitted to [`EmbeddingGateway::embed_contextual`] is wrapped with its
//! deterministic structural label (`"[Document: {title} | Section: {path}] {text}"`)
//! by the caller before it reaches this crate; the gateway itself is agnostic to what a
//! "unit" represents (sentence, chunk, entity, or community summary) and never strips or
//! re-derives the label, it only ever embeds what it is given.
//!
//! The gateway never returns a partial batch or a degraded vector: a provider failure that
//! survives retries is [`EmbeddingError::ProviderError`], a malformed configuration is
//! [`EmbeddingError::InvalidModel`] or [`EmbeddingError::InvalidConfig`], and a 429-class
//! response is [`EmbeddingError::RateLimited`] — surfaced to the caller rather than retried
//! internally, since only the orchestrator (§4.8) owns the retry/backoff policy for that case.
//!
//! ## Example
//!
//! ```
//! # tokio_test::block_on(async {
//! use graphrag_embedding::{EmbeddingConfig, EmbeddingGateway};
//!
//! let gateway = EmbeddingGateway::new(EmbeddingConfig {
//!     mode: "stub".into(),
//!     ..Default::default()
//! });
//!
//! let vectors = gateway
//!     .embed_contextual(
//!         "Sample Contract",
//!         "Terms > Payment",
//!         &[("sentence-1".into(), "The total was due net thirty.".into())],
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(vectors[0].vector.len(), graphrag_embedding::EMBEDDING_DIM);
//! # });
//! ```

pub mod config;
pub mod error;
pub mod types;

// Resilience bits, shared by every provider call.
pub mod circuit_breaker;
pub mod rate_limit;
pub mod retry;
mod serde_millis;

mod api;
mod assets;
mod cache;
mod normalize;
mod onnx;
mod stub;

pub use crate::config::EmbeddingConfig;
pub use crate::error::EmbeddingError;
pub use crate::types::{ContextualUnit, Embedding, RerankCandidate, RerankedPassage};

use crate::api::{embed_contextual_via_api, rerank_via_api};
use crate::assets::{resolve_model_assets, should_fallback_to_stub};
use crate::cache::get_or_load_model_handle;
use crate::normalize::l2_normalize_in_place;
use crate::onnx::run_onnx_embeddings;
use crate::stub::{make_stub_embedding, make_stub_rerank_score};

/// The fixed embedding width every vector index in the graph store is built against
/// (§3, §12). A provider that returns a vector of any other length is a configuration
/// error, not data to store: see [`EmbeddingError::InvalidModel`].
pub const EMBEDDING_DIM: usize = 2048;

/// Wraps `text` with the deterministic structural label the spec requires be baked into
/// the vector but never stored as the unit's own text (§4.1).
pub fn structural_label(doc_title: &str, section_path: &str, text: &str) -> String {
    format!("[Document: {doc_title} | Section: {section_path}] {text}")
}

/// The embedding gateway: `embed_contextual`, `embed_query`, `rerank`.
pub struct EmbeddingGateway {
    config: EmbeddingConfig,
}

impl EmbeddingGateway {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Embeds every `(id, raw_text)` unit with awareness of its document context, idempotent
    /// per `(doc_context, unit)` pair. Units may be sentences, chunks, or entity canonical
    /// forms; the caller supplies `section_path` per batch (all units here share one document
    /// and, typically, one section).
    pub async fn embed_contextual(
        &self,
        doc_title: &str,
        section_path: &str,
        units: &[(String, String)],
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        if units.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = units.iter().map(|(id, _)| id.clone()).collect();
        let wrapped: Vec<String> = units
            .iter()
            .map(|(_, text)| structural_label(doc_title, section_path, text))
            .collect();

        match self.config.mode.as_str() {
            "stub" => Ok(ids
                .iter()
                .zip(wrapped.iter())
                .map(|(id, text)| make_stub_embedding(id, text, &self.config))
                .collect()),
            "api" => embed_contextual_via_api(&ids, &wrapped, &self.config).await,
            _ => self.embed_contextual_onnx(&ids, &wrapped).await,
        }
    }

    async fn embed_contextual_onnx(
        &self,
        ids: &[String],
        wrapped: &[String],
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let assets = match resolve_model_assets(&self.config).await {
            Ok(assets) => assets,
            Err(err) if should_fallback_to_stub(&err) => {
                return Ok(ids
                    .iter()
                    .zip(wrapped.iter())
                    .map(|(id, text)| make_stub_embedding(id, text, &self.config))
                    .collect());
            }
            Err(err) => return Err(err),
        };

        let handle = get_or_load_model_handle(&assets)?;
        let texts: Vec<&str> = wrapped.iter().map(String::as_str).collect();
        let mut vectors = run_onnx_embeddings(
            handle.as_ref(),
            &texts,
            self.config.max_sequence_length,
            self.config.enable_chunking,
            self.config.chunk_overlap_ratio,
            &self.config.pooling_strategy,
        )?;

        if vectors.len() != ids.len() {
            return Err(EmbeddingError::ProviderError(format!(
                "model returned {} embeddings for {} inputs",
                vectors.len(),
                ids.len()
            )));
        }

        let mut out = Vec::with_capacity(ids.len());
        for (id, vector) in ids.iter().zip(vectors.iter_mut()) {
            if vector.len() != EMBEDDING_DIM {
                return Err(EmbeddingError::InvalidModel(format!(
                    "local model produced {}-dim vector, expected {EMBEDDING_DIM}",
                    vector.len()
                )));
            }
            if self.config.normalize {
                l2_normalize_in_place(vector);
            }
            out.push(Embedding {
                id: id.clone(),
                vector: std::mem::take(vector),
                model_name: self.config.model_name.clone(),
                normalized: self.config.normalize,
            });
        }
        Ok(out)
    }

    /// Single-unit embedding for query-time retrieval. Queries have no document context of
    /// their own, so the structural label degrades to the bare query text.
    pub async fn embed_query(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let id = "query".to_string();
        let units = [(id.clone(), text.to_string())];
        let mut results = match self.config.mode.as_str() {
            "stub" => vec![make_stub_embedding(&id, text, &self.config)],
            "api" => embed_contextual_via_api(&[id.clone()], &[text.to_string()], &self.config).await?,
            _ => self.embed_contextual_onnx(&[id.clone()], &[text.to_string()]).await?,
        };
        let _ = &units;
        results
            .pop()
            .ok_or_else(|| EmbeddingError::ProviderError("no embedding returned for query".into()))
    }

    /// Deterministic cross-encoder scoring: passages are scored jointly with the query, not
    /// independently. Used only in Stage 2 of retrieval per §4.1, never in synthesis.
    pub async fn rerank(
        &self,
        query: &str,
        passages: &[RerankCandidate],
    ) -> Result<Vec<RerankedPassage>, EmbeddingError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        match self.config.mode.as_str() {
            "stub" | "onnx" => {
                let mut ranked: Vec<RerankedPassage> = passages
                    .iter()
                    .map(|p| RerankedPassage {
                        passage_id: p.passage_id.clone(),
                        score: make_stub_rerank_score(query, &p.text),
                    })
                    .collect();
                ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
                Ok(ranked)
            }
            "api" => {
                let pairs: Vec<(String, String)> = passages
                    .iter()
                    .map(|p| (p.passage_id.clone(), p.text.clone()))
                    .collect();
                rerank_via_api(query, &pairs, &self.config).await
            }
            other => Err(EmbeddingError::InvalidConfig(format!("unknown mode '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_gateway() -> EmbeddingGateway {
        EmbeddingGateway::new(EmbeddingConfig {
            mode: "stub".into(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn embed_contextual_returns_fixed_dimension() {
        let gateway = stub_gateway();
        let units = vec![("s1".to_string(), "The total was due net thirty.".to_string())];
        let result = gateway
            .embed_contextual("Sample Contract", "Terms > Payment", &units)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].vector.len(), EMBEDDING_DIM);
        assert_eq!(result[0].id, "s1");
    }

    #[tokio::test]
    async fn embed_contextual_is_idempotent_per_doc_context_and_unit() {
        let gateway = stub_gateway();
        let units = vec![("s1".to_string(), "same text".to_string())];
        let a = gateway.embed_contextual("Doc", "Section", &units).await.unwrap();
        let b = gateway.embed_contextual("Doc", "Section", &units).await.unwrap();
        assert_eq!(a[0].vector, b[0].vector);
    }

    #[tokio::test]
    async fn embed_contextual_varies_with_document_context() {
        let gateway = stub_gateway();
        let units = vec![("s1".to_string(), "same text".to_string())];
        let a = gateway.embed_contextual("Doc A", "Section", &units).await.unwrap();
        let b = gateway.embed_contextual("Doc B", "Section", &units).await.unwrap();
        assert_ne!(a[0].vector, b[0].vector);
    }

    #[tokio::test]
    async fn embed_contextual_empty_batch_is_empty() {
        let gateway = stub_gateway();
        let result = gateway.embed_contextual("Doc", "Section", &[]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn embed_query_returns_fixed_dimension() {
        let gateway = stub_gateway();
        let embedding = gateway.embed_query("who is the agent?").await.unwrap();
        assert_eq!(embedding.vector.len(), EMBEDDING_DIM);
    }

    #[tokio::test]
    async fn rerank_orders_by_relevance_descending() {
        let gateway = stub_gateway();
        let passages = vec![
            RerankCandidate {
                passage_id: "p1".into(),
                text: "unrelated content about weather".into(),
            },
            RerankCandidate {
                passage_id: "p2".into(),
                text: "invoice total was due net thirty".into(),
            },
        ];
        let ranked = gateway.rerank("invoice total", &passages).await.unwrap();
        assert_eq!(ranked[0].passage_id, "p2");
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[tokio::test]
    async fn rerank_empty_passages_is_empty() {
        let gateway = stub_gateway();
        let ranked = gateway.rerank("query", &[]).await.unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn api_mode_without_url_is_invalid_config() {
        let gateway = EmbeddingGateway::new(EmbeddingConfig {
            mode: "api".into(),
            api_url: None,
            ..Default::default()
        });
        let err = gateway
            .embed_contextual("Doc", "Section", &[("s1".into(), "text".into())])
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidConfig(_)));
    }

    #[test]
    fn structural_label_wraps_text_with_context() {
        let label = structural_label("Sample Contract", "Terms > Payment", "The total was due.");
        assert_eq!(
            label,
            "[Document: Sample Contract | Section: Terms > Payment] The total was due."
        );
    }
}
