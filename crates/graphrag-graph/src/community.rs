//! Community detection over the entity graph (indexing-time only, feeds
//! the `CommunitiesDetected` state in [`crate::state::IndexingState`]).
//!
//! Pure, deterministic label propagation over `SEMANTICALLY_SIMILAR`
//! entity edges: cheap, auditable, and — per `DESIGN.md`'s open-question
//! writeup — preferred over iterative modularity optimization for the
//! same reason `ann.rs`'s greedy candidate search is preferred over an
//! exact nearest-neighbor search. Summarization and re-embedding of the
//! resulting communities happen one layer up, in the indexing pipeline,
//! since this crate has no LLM or embedding dependency.

use std::collections::{BTreeMap, HashMap};

use crate::types::{NodeId, ProbabilisticEdge, ProbabilisticEdgeKind};

const MAX_ITERATIONS: usize = 20;

/// One pass of label propagation: every node adopts the most frequent
/// label among its neighbors, ties broken by lowest node id for
/// determinism. Isolated entities (no `SEMANTICALLY_SIMILAR` edges) form
/// their own singleton community.
pub fn detect_communities(entity_ids: &[NodeId], edges: &[ProbabilisticEdge]) -> Vec<Vec<NodeId>> {
    if entity_ids.is_empty() {
        return Vec::new();
    }

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for id in entity_ids {
        adjacency.entry(id.as_str()).or_default();
    }
    for edge in edges {
        if edge.kind != ProbabilisticEdgeKind::SemanticallySimilar {
            continue;
        }
        if adjacency.contains_key(edge.from.as_str()) && adjacency.contains_key(edge.to.as_str()) {
            adjacency.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
            adjacency.entry(edge.to.as_str()).or_default().push(edge.from.as_str());
        }
    }

    // Deterministic node order for both initialization and update sweeps.
    let mut order: Vec<&str> = entity_ids.iter().map(|s| s.as_str()).collect();
    order.sort_unstable();

    let mut labels: BTreeMap<&str, &str> = order.iter().map(|&id| (id, id)).collect();

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for &node in &order {
            let neighbors = &adjacency[node];
            if neighbors.is_empty() {
                continue;
            }
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for &n in neighbors {
                *counts.entry(labels[n]).or_insert(0) += 1;
            }
            let best = counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(label, _)| label)
                .unwrap_or(node);
            if labels[node] != best {
                labels.insert(node, best);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut grouped: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
    for &node in &order {
        grouped.entry(labels[node]).or_default().push(node.to_string());
    }
    grouped.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SimilarityMethod;

    fn edge(from: &str, to: &str, sim: f32) -> ProbabilisticEdge {
        ProbabilisticEdge {
            kind: ProbabilisticEdgeKind::SemanticallySimilar,
            from: from.to_string(),
            to: to.to_string(),
            method: SimilarityMethod::CosineKnn,
            similarity: sim,
        }
    }

    #[test]
    fn isolated_entities_form_singleton_communities() {
        let ids = vec!["e1".to_string(), "e2".to_string()];
        let communities = detect_communities(&ids, &[]);
        assert_eq!(communities.len(), 2);
    }

    #[test]
    fn densely_connected_entities_merge_into_one_community() {
        let ids = vec!["e1".to_string(), "e2".to_string(), "e3".to_string()];
        let edges = vec![edge("e1", "e2", 0.9), edge("e2", "e3", 0.9), edge("e1", "e3", 0.9)];
        let communities = detect_communities(&ids, &edges);
        assert_eq!(communities.len(), 1);
        assert_eq!(communities[0].len(), 3);
    }

    #[test]
    fn two_disjoint_clusters_stay_separate() {
        let ids = vec!["a1".to_string(), "a2".to_string(), "b1".to_string(), "b2".to_string()];
        let edges = vec![edge("a1", "a2", 0.9), edge("b1", "b2", 0.9)];
        let communities = detect_communities(&ids, &edges);
        assert_eq!(communities.len(), 2);
        for community in &communities {
            assert_eq!(community.len(), 2);
        }
    }

    #[test]
    fn deterministic_across_repeated_runs() {
        let ids = vec!["e1".to_string(), "e2".to_string(), "e3".to_string(), "e4".to_string()];
        let edges = vec![edge("e1", "e2", 0.7), edge("e3", "e4", 0.7), edge("e2", "e3", 0.61)];
        let first = detect_communities(&ids, &edges);
        let second = detect_communities(&ids, &edges);
        assert_eq!(first, second);
    }
}
