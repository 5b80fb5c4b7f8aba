//! k-NN edge builders for the two probabilistic edge families.
//!
//! Both builders are indexing-time only: they run once per group, over
//! already-embedded nodes, and enforce the sparsity budget (§3/§8.3 —
//! total semantic edges across a group must never exceed `2 * node_count`).

use crate::error::GraphError;
use crate::types::{ProbabilisticEdge, ProbabilisticEdgeKind, SimilarityMethod};

pub const SENTENCE_KNN_THRESHOLD_DEFAULT: f32 = 0.90;
pub const SENTENCE_KNN_MAX_K_DEFAULT: usize = 2;
pub const ENTITY_KNN_TOP_K_DEFAULT: usize = 5;
pub const ENTITY_KNN_SIMILARITY_CUTOFF_DEFAULT: f32 = 0.60;

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Input to the sentence k-NN builder: a sentence id, its parent chunk id
/// (for the cross-chunk restriction), and its embedding.
pub struct SentenceVector<'a> {
    pub id: &'a str,
    pub chunk_id: &'a str,
    pub embedding: &'a [f32],
}

/// Builds `RELATED_TO` edges: similarity >= threshold, different parent
/// chunks, capped at `max_k` outgoing edges per sentence. The cross-chunk
/// restriction is deliberate — it's what keeps this edge family a discovery
/// signal (cross-document linkage) rather than duplicating the deterministic
/// `NEXT` edge's proximity signal.
pub fn build_sentence_knn_edges(
    sentences: &[SentenceVector<'_>],
    threshold: f32,
    max_k: usize,
) -> Vec<ProbabilisticEdge> {
    let mut edges = Vec::new();
    for s in sentences {
        let mut scored: Vec<(f32, &str)> = sentences
            .iter()
            .filter(|o| o.chunk_id != s.chunk_id)
            .map(|o| (cosine(s.embedding, o.embedding), o.id))
            .filter(|(sim, _)| *sim >= threshold)
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });
        for (sim, other) in scored.into_iter().take(max_k) {
            edges.push(ProbabilisticEdge {
                kind: ProbabilisticEdgeKind::RelatedTo,
                from: s.id.to_string(),
                to: other.to_string(),
                method: SimilarityMethod::CosineKnn,
                similarity: sim,
            });
        }
    }
    edges
}

pub struct EntityVector<'a> {
    pub id: &'a str,
    pub embedding: &'a [f32],
}

/// Builds `SEMANTICALLY_SIMILAR` edges between entities: top-k = 5,
/// threshold 0.60 by default. The relaxed threshold (vs. the sentence
/// builder's 0.90) is acceptable because entity embeddings are dense
/// semantic anchors, not short spans, and downstream beam search bounds the
/// blast radius regardless.
pub fn build_entity_knn_edges(
    entities: &[EntityVector<'_>],
    threshold: f32,
    top_k: usize,
) -> Vec<ProbabilisticEdge> {
    let mut edges = Vec::new();
    for e in entities {
        let mut scored: Vec<(f32, &str)> = entities
            .iter()
            .filter(|o| o.id != e.id)
            .map(|o| (cosine(e.embedding, o.embedding), o.id))
            .filter(|(sim, _)| *sim >= threshold)
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });
        for (sim, other) in scored.into_iter().take(top_k) {
            edges.push(ProbabilisticEdge {
                kind: ProbabilisticEdgeKind::SemanticallySimilar,
                from: e.id.to_string(),
                to: other.to_string(),
                method: SimilarityMethod::CosineKnn,
                similarity: sim,
            });
        }
    }
    edges
}

/// Enforces the sparsity budget (§3): total probabilistic edges for a group
/// must never exceed `2 * node_count`. Called after both builders run for a
/// group, over their combined output.
pub fn check_sparsity_budget(edge_count: usize, node_count: usize, group_id: &str) -> Result<(), GraphError> {
    let limit = 2 * node_count;
    if edge_count > limit {
        return Err(GraphError::SparsityBudgetExceeded {
            group_id: group_id.to_string(),
            count: edge_count,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vec<f32> {
        vec![x, y]
    }

    #[test]
    fn sentence_knn_excludes_same_chunk() {
        let a = v(1.0, 0.0);
        let b = v(0.99, 0.01);
        let sentences = vec![
            SentenceVector { id: "s1", chunk_id: "c1", embedding: &a },
            SentenceVector { id: "s2", chunk_id: "c1", embedding: &b }, // same chunk, excluded
        ];
        let edges = build_sentence_knn_edges(&sentences, 0.90, 2);
        assert!(edges.is_empty());
    }

    #[test]
    fn sentence_knn_respects_threshold_and_cross_chunk() {
        let a = v(1.0, 0.0);
        let b = v(0.95, 0.05);
        let c = v(0.0, 1.0);
        let sentences = vec![
            SentenceVector { id: "s1", chunk_id: "c1", embedding: &a },
            SentenceVector { id: "s2", chunk_id: "c2", embedding: &b },
            SentenceVector { id: "s3", chunk_id: "c3", embedding: &c },
        ];
        let edges = build_sentence_knn_edges(&sentences, 0.90, 2);
        assert!(edges.iter().any(|e| e.from == "s1" && e.to == "s2"));
        assert!(edges.iter().all(|e| e.similarity >= 0.90));
        assert!(!edges.iter().any(|e| e.to == "s3" || e.from == "s3"));
    }

    #[test]
    fn sentence_knn_caps_outgoing_degree() {
        let base = v(1.0, 0.0);
        let mut sentences = vec![SentenceVector { id: "anchor", chunk_id: "c0", embedding: &base }];
        let others: Vec<Vec<f32>> = (0..5).map(|i| v(1.0 - (i as f32) * 0.001, 0.001 * i as f32)).collect();
        for (i, emb) in others.iter().enumerate() {
            sentences.push(SentenceVector {
                id: Box::leak(format!("s{i}").into_boxed_str()),
                chunk_id: Box::leak(format!("c{}", i + 1).into_boxed_str()),
                embedding: emb,
            });
        }
        let edges = build_sentence_knn_edges(&sentences, 0.90, 2);
        let out_degree = edges.iter().filter(|e| e.from == "anchor").count();
        assert!(out_degree <= 2);
    }

    #[test]
    fn entity_knn_respects_top_k_and_threshold() {
        let a = v(1.0, 0.0);
        let b = v(0.9, 0.1);
        let c = v(0.0, 1.0);
        let entities = vec![
            EntityVector { id: "e1", embedding: &a },
            EntityVector { id: "e2", embedding: &b },
            EntityVector { id: "e3", embedding: &c },
        ];
        let edges = build_entity_knn_edges(&entities, 0.60, 5);
        assert!(edges.iter().any(|e| e.from == "e1" && e.to == "e2"));
        assert!(edges.iter().all(|e| e.similarity >= 0.60));
    }

    #[test]
    fn sparsity_budget_enforced() {
        assert!(check_sparsity_budget(20, 10, "g1").is_ok());
        assert!(check_sparsity_budget(21, 10, "g1").is_err());
    }
}
