use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::types::Embedding;
use crate::{EmbeddingConfig, EMBEDDING_DIM};

/// Deterministic stub used in `"stub"` mode and as the fallback when the
/// local ONNX assets are unavailable. Generates sinusoid values derived from
/// a hash of the (structural-label-wrapped) text, guaranteeing reproducible
/// [`crate::EMBEDDING_DIM`]-wide vectors with minimal CPU cost.
pub(crate) fn make_stub_embedding(id: &str, text: &str, cfg: &EmbeddingConfig) -> Embedding {
    let mut v = vec![0f32; EMBEDDING_DIM];
    let h = hash64(text.as_bytes());
    for (idx, value) in v.iter_mut().enumerate() {
        *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
    }
    if cfg.normalize {
        l2_normalize_in_place(&mut v);
    }
    Embedding {
        id: id.to_string(),
        vector: v,
        model_name: cfg.model_name.clone(),
        normalized: cfg.normalize,
    }
}

/// Stub rerank: scores each passage by token overlap with the query, giving
/// the test suite a deterministic, non-uniform ranking without a real
/// cross-encoder.
pub(crate) fn make_stub_rerank_score(query: &str, passage: &str) -> f32 {
    let query_tokens: std::collections::HashSet<&str> = query.split_whitespace().collect();
    if query_tokens.is_empty() {
        return 0.0;
    }
    let overlap = passage
        .split_whitespace()
        .filter(|t| query_tokens.contains(t))
        .count();
    overlap as f32 / query_tokens.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_embedding_has_fixed_dimension() {
        let cfg = EmbeddingConfig::default();
        let e = make_stub_embedding("s1", "[Document: D | Section: S] hello world", &cfg);
        assert_eq!(e.vector.len(), EMBEDDING_DIM);
    }

    #[test]
    fn stub_embedding_deterministic_per_text() {
        let cfg = EmbeddingConfig {
            normalize: false,
            ..Default::default()
        };
        let a = make_stub_embedding("id-a", "same text", &cfg);
        let b = make_stub_embedding("id-b", "same text", &cfg);
        assert_eq!(a.vector, b.vector);
    }

    #[test]
    fn stub_embedding_differs_by_text() {
        let cfg = EmbeddingConfig {
            normalize: false,
            ..Default::default()
        };
        let a = make_stub_embedding("id", "hello", &cfg);
        let b = make_stub_embedding("id", "world", &cfg);
        assert_ne!(a.vector, b.vector);
    }

    #[test]
    fn stub_embedding_normalizes_when_requested() {
        let cfg = EmbeddingConfig {
            normalize: true,
            ..Default::default()
        };
        let e = make_stub_embedding("id", "text", &cfg);
        let norm: f32 = e.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn stub_rerank_ranks_overlap_higher() {
        let query = "invoice total amount";
        let high = make_stub_rerank_score(query, "the invoice total was $100");
        let low = make_stub_rerank_score(query, "unrelated text about weather");
        assert!(high > low);
    }

    #[test]
    fn stub_rerank_empty_query_is_zero() {
        assert_eq!(make_stub_rerank_score("", "anything"), 0.0);
    }
}
