//! Bounded beam search over the probabilistic edge families.
//!
//! Used by Route 4 (DRIFT) to expand from PPR-ranked entities. Always finite:
//! the search is bounded by `hops * beam_width`, never by graph size, per the
//! "cyclic graphs" design note — this crate never performs unbounded
//! recursive traversal.

use std::collections::HashSet;

use crate::types::ProbabilisticEdge;

#[derive(Debug, Clone)]
pub struct BeamPath {
    pub nodes: Vec<String>,
    /// Product of edge similarities along the path.
    pub score: f32,
}

/// `semantic_beam(start_entities, hops, beam_width, edges)`. `edges` is the
/// full probabilistic adjacency for the group (both `RELATED_TO` and
/// `SEMANTICALLY_SIMILAR`, pre-filtered by the caller to the edge types it
/// wants walked); this function only ever reads it, it never re-queries the
/// store mid-walk.
pub fn semantic_beam(
    start_entities: &[String],
    hops: usize,
    beam_width: usize,
    edges: &[ProbabilisticEdge],
) -> Vec<BeamPath> {
    let mut adjacency: std::collections::HashMap<&str, Vec<(&str, f32)>> =
        std::collections::HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.from.as_str())
            .or_default()
            .push((edge.to.as_str(), edge.similarity));
        // Edges in this family are semantic k-NN links, not directional
        // assertions about meaning, so the walk treats them as undirected.
        adjacency
            .entry(edge.to.as_str())
            .or_default()
            .push((edge.from.as_str(), edge.similarity));
    }

    let mut beam: Vec<BeamPath> = start_entities
        .iter()
        .map(|e| BeamPath {
            nodes: vec![e.clone()],
            score: 1.0,
        })
        .collect();

    for _ in 0..hops {
        let mut candidates: Vec<BeamPath> = Vec::new();
        for path in &beam {
            let Some(last) = path.nodes.last() else {
                continue;
            };
            let visited: HashSet<&str> = path.nodes.iter().map(|s| s.as_str()).collect();
            if let Some(neighbors) = adjacency.get(last.as_str()) {
                for (to, similarity) in neighbors {
                    if visited.contains(to) {
                        continue;
                    }
                    let mut nodes = path.nodes.clone();
                    nodes.push((*to).to_string());
                    candidates.push(BeamPath {
                        nodes,
                        score: path.score * similarity,
                    });
                }
            }
        }
        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.nodes.cmp(&b.nodes))
        });
        candidates.truncate(beam_width);
        beam = candidates;
    }

    beam.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.nodes.cmp(&b.nodes))
    });
    beam
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProbabilisticEdgeKind, SimilarityMethod};

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
    fn expands_up_to_hops() {
        let edges = vec![edge("a", "b", 0.9), edge("b", "c", 0.8)];
        let paths = semantic_beam(&["a".to_string()], 2, 10, &edges);
        let longest = paths.iter().map(|p| p.nodes.len()).max().unwrap();
        assert_eq!(longest, 3);
    }

    #[test]
    fn never_revisits_a_node_in_one_path() {
        let edges = vec![edge("a", "b", 0.9), edge("b", "a", 0.9)];
        let paths = semantic_beam(&["a".to_string()], 5, 10, &edges);
        for p in &paths {
            let unique: HashSet<&String> = p.nodes.iter().collect();
            assert_eq!(unique.len(), p.nodes.len());
        }
    }

    #[test]
    fn beam_width_bounds_candidate_count() {
        let edges = vec![
            edge("a", "b", 0.9),
            edge("a", "c", 0.8),
            edge("a", "d", 0.7),
        ];
        let paths = semantic_beam(&["a".to_string()], 1, 2, &edges);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].nodes, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn no_edges_returns_singleton_paths() {
        let edges: Vec<ProbabilisticEdge> = Vec::new();
        let paths = semantic_beam(&["a".to_string()], 3, 10, &edges);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].nodes, vec!["a".to_string()]);
    }
}
