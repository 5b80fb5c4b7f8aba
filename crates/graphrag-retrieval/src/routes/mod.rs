pub mod drift;
pub mod global;
pub mod local;
pub mod unified;

use std::cmp::Ordering;
use std::collections::HashMap;

use graphrag_embedding::EmbeddingGateway;
use graphrag_graph::types::{Node, Sentence};
use graphrag_graph::vectors::SENTENCE_EMBEDDINGS_V2;
use graphrag_graph::GraphStore;

use crate::error::RetrievalError;
use crate::types::{Citation, EvidenceItem};

/// Decay applied per edge hop during anchor expansion (§4.4 stage 2).
const EXPANSION_DECAY: f32 = 0.8;
const NEXT_HOP_LIMIT: usize = 2;

/// Output of Route 2's anchor + expand stages, reused by Route 3 (as its
/// "insurance policy" sentence evidence) and Route 5 (merged with PPR).
#[derive(Debug, Clone, Default)]
pub(crate) struct AnchorExpansion {
    pub evidence: Vec<EvidenceItem>,
    pub citations: Vec<Citation>,
}

/// Anchors on the top-`top_k` sentences by vector similarity, then expands
/// each anchor along `NEXT` (±2 hops, via the sentence's own prev/next
/// fields — zero graph hops) and one `RELATED_TO` hop, collapses by
/// `parent_paragraph_id`, and heuristically reranks the resulting
/// paragraphs (§4.4 stages 1-4).
pub(crate) async fn anchor_and_expand(
    graph: &GraphStore,
    embeddings: &EmbeddingGateway,
    group_id: &str,
    query: &str,
    top_k: usize,
) -> Result<AnchorExpansion, RetrievalError> {
    let query_vector = embeddings.embed_query(query).await?;
    let anchors = graph.search_vectors(SENTENCE_EMBEDDINGS_V2, group_id, &query_vector.vector, top_k)?;
    if anchors.is_empty() {
        return Ok(AnchorExpansion::default());
    }

    let nodes = graph.scan_nodes(group_id)?;
    let mut sentences: HashMap<String, Sentence> = HashMap::new();
    for node in nodes {
        if let Node::Sentence(s) = node {
            sentences.insert(s.id.clone(), s);
        }
    }

    let anchor_scores: HashMap<String, f32> = anchors.iter().map(|h| (h.node_id.clone(), h.score)).collect();
    let prob_edges = graph.scan_probabilistic_edges(group_id)?;

    let mut expanded: HashMap<String, f32> = HashMap::new();
    let mut bump = |expanded: &mut HashMap<String, f32>, id: String, score: f32| {
        expanded.entry(id).and_modify(|existing| *existing = existing.max(score)).or_insert(score);
    };

    for (anchor_id, anchor_score) in &anchor_scores {
        bump(&mut expanded, anchor_id.clone(), *anchor_score);
        let Some(anchor) = sentences.get(anchor_id) else { continue };

        let mut next_cursor = anchor.next_sentence_id.clone();
        let mut decay = *anchor_score;
        for _ in 0..NEXT_HOP_LIMIT {
            let Some(next_id) = next_cursor else { break };
            decay *= EXPANSION_DECAY;
            bump(&mut expanded, next_id.clone(), decay);
            next_cursor = sentences.get(&next_id).and_then(|s| s.next_sentence_id.clone());
        }

        let mut prev_cursor = anchor.prev_sentence_id.clone();
        let mut decay = *anchor_score;
        for _ in 0..NEXT_HOP_LIMIT {
            let Some(prev_id) = prev_cursor else { break };
            decay *= EXPANSION_DECAY;
            bump(&mut expanded, prev_id.clone(), decay);
            prev_cursor = sentences.get(&prev_id).and_then(|s| s.prev_sentence_id.clone());
        }

        for edge in &prob_edges {
            if edge.from == *anchor_id {
                bump(&mut expanded, edge.to.clone(), anchor_score * edge.similarity * EXPANSION_DECAY);
            }
        }
    }

    let mut by_paragraph: HashMap<String, Vec<(String, f32)>> = HashMap::new();
    for (sentence_id, score) in &expanded {
        if let Some(sentence) = sentences.get(sentence_id) {
            by_paragraph.entry(sentence.paragraph_id.clone()).or_default().push((sentence_id.clone(), *score));
        }
    }

    let mut paragraphs: Vec<(String, f32, String, String)> = Vec::new();
    for (paragraph_id, mut scored) in by_paragraph {
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let (best_sentence_id, _) = scored[0].clone();

        let anchor_hits: Vec<f32> = scored
            .iter()
            .filter(|(id, _)| anchor_scores.contains_key(id))
            .map(|(_, score)| *score)
            .collect();
        let anchor_sum: f32 = anchor_hits.iter().sum();
        let multi_anchor = anchor_hits.len() >= 2;
        let low_confidence = sentences.get(&best_sentence_id).map(|s| s.confidence < 0.5).unwrap_or(false);

        let rerank_score = anchor_sum
            + if multi_anchor { 1.5 } else { 0.0 }
            - if low_confidence { 0.5 } else { 0.0 };

        let text = sentences
            .get(&best_sentence_id)
            .map(|s| s.parent_paragraph_text.clone())
            .unwrap_or_default();

        paragraphs.push((paragraph_id, rerank_score, text, best_sentence_id));
    }
    paragraphs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0)));

    let evidence = paragraphs
        .iter()
        .map(|(id, score, text, _)| EvidenceItem { id: id.clone(), text: text.clone(), score: *score })
        .collect();
    let citations = paragraphs
        .iter()
        .map(|(_, _, text, sentence_id)| Citation {
            node_id: sentence_id.clone(),
            excerpt: text.chars().take(160).collect(),
        })
        .collect();

    Ok(AnchorExpansion { evidence, citations })
}

/// Simple confidence heuristic shared by routes that don't define their own
/// (Route 4 computes entity-coverage × avg-path-score instead, per §4.6).
pub(crate) fn heuristic_confidence(evidence: &[EvidenceItem]) -> f32 {
    evidence.first().map(|e| e.score.clamp(0.0, 1.0)).unwrap_or(0.0)
}
