use serde::{Deserialize, Serialize};

/// A single unit submitted for contextual embedding: a sentence, chunk, entity mention, or
/// community summary, plus the structural label the gateway wraps it in before embedding so the
/// provider sees "what kind of thing is this" alongside the text itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextualUnit {
    /// Caller-assigned identifier (graph node id) echoed back on the resulting [`Embedding`].
    pub id: String,
    /// Structural role of this unit, e.g. `"sentence"`, `"chunk"`, `"entity"`, `"community_summary"`.
    pub structural_label: String,
    /// Raw unit text.
    pub text: String,
}

/// Embedding output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    /// Identifier of the processed unit (mirrors [`ContextualUnit::id`], or a synthetic id for
    /// ad-hoc query embeddings).
    pub id: String,
    /// Final embedding values (either model output or deterministic stub). Always
    /// [`crate::EMBEDDING_DIM`] long.
    pub vector: Vec<f32>,
    /// Name of the model used to produce the vector.
    pub model_name: String,
    /// Whether [`vector`](Self::vector) was L2-normalized.
    pub normalized: bool,
}

/// A passage scored against a query by [`crate::EmbeddingGateway::rerank`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RerankCandidate {
    pub passage_id: String,
    pub text: String,
}

/// Rerank result: passage id plus relevance score, descending by score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RerankedPassage {
    pub passage_id: String,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_serde_roundtrip() {
        let embedding = Embedding {
            id: "sentence-1".into(),
            vector: vec![0.1, 0.2, 0.3, 0.4],
            model_name: "bge-large".into(),
            normalized: true,
        };

        let serialized = serde_json::to_string(&embedding).unwrap();
        let deserialized: Embedding = serde_json::from_str(&serialized).unwrap();
        assert_eq!(embedding, deserialized);
    }

    #[test]
    fn reranked_passage_equality() {
        let a = RerankedPassage {
            passage_id: "p1".into(),
            score: 0.9,
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
