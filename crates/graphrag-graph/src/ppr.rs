//! Personalized PageRank over the entity/community adjacency.
//!
//! The entity graph is arbitrarily cyclic; PPR is the canonical way to
//! reason about it without ever walking it unbounded. This is a plain
//! power-iteration implementation — the adjacency here is small enough
//! (entities + communities per group, not sentences) that a sparse matrix
//! library would be overhead, not a win.

use std::collections::HashMap;

use crate::error::GraphError;

/// Adjacency as an out-neighbor list with edge weights (similarity or a
/// uniform 1.0 for deterministic edges). Self-contained so callers can build
/// it once per group and reuse it across several `ppr` calls in one query.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    out_edges: HashMap<String, Vec<(String, f32)>>,
}

impl Adjacency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, from: &str, to: &str, weight: f32) {
        self.out_edges
            .entry(from.to_string())
            .or_default()
            .push((to.to_string(), weight));
    }

    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.out_edges.keys()
    }
}

const MAX_ITERATIONS: usize = 50;
const CONVERGENCE_EPSILON: f32 = 1e-6;

/// `ppr(seed_weights, damping, top_k, adjacency) -> [(node_id, score)]`.
///
/// `seed_weights` must already sum to 1.0 (the Seed Resolver normalises
/// before calling). Returns the top-k nodes by steady-state visit
/// probability, descending, ties broken by node id for determinism.
pub fn ppr(
    seed_weights: &HashMap<String, f32>,
    damping: f32,
    top_k: usize,
    adjacency: &Adjacency,
) -> Result<Vec<(String, f32)>, GraphError> {
    let total: f32 = seed_weights.values().sum();
    if (total - 1.0).abs() > 1e-3 {
        return Err(GraphError::InvalidSeedWeights(total));
    }

    // The universe is every node mentioned either as a seed or as an
    // adjacency endpoint, so dangling seeds (not yet linked to anything)
    // still retain their teleportation mass.
    let mut universe: HashMap<String, usize> = HashMap::new();
    for node in seed_weights.keys() {
        let next = universe.len();
        universe.entry(node.clone()).or_insert(next);
    }
    for (from, edges) in adjacency.out_edges.iter() {
        let next = universe.len();
        universe.entry(from.clone()).or_insert(next);
        for (to, _) in edges {
            let next = universe.len();
            universe.entry(to.clone()).or_insert(next);
        }
    }

    let n = universe.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut teleport = vec![0.0f32; n];
    for (node, weight) in seed_weights {
        teleport[universe[node]] = *weight;
    }

    // Row-normalised transition weights; nodes with no outgoing edges
    // teleport their entire mass back to the seed distribution (dangling
    // node handling), which keeps the walk well-defined on a cyclic, sparse
    // graph where most nodes have zero or one out-edge.
    let mut out_weights: Vec<Vec<(usize, f32)>> = vec![Vec::new(); n];
    for (from, edges) in adjacency.out_edges.iter() {
        let from_idx = universe[from];
        let total_w: f32 = edges.iter().map(|(_, w)| w.max(0.0)).sum();
        if total_w <= 0.0 {
            continue;
        }
        for (to, w) in edges {
            out_weights[from_idx].push((universe[to], w.max(0.0) / total_w));
        }
    }

    let mut scores = teleport.clone();
    for _ in 0..MAX_ITERATIONS {
        let mut next = vec![0.0f32; n];
        for (idx, score) in scores.iter().enumerate() {
            if *score == 0.0 {
                continue;
            }
            if out_weights[idx].is_empty() {
                next[idx] += score; // dangling mass stays put this iteration
            } else {
                for (to_idx, w) in &out_weights[idx] {
                    next[*to_idx] += damping * score * w;
                }
            }
        }
        for (idx, t) in teleport.iter().enumerate() {
            next[idx] += (1.0 - damping) * t;
        }

        let delta: f32 = next
            .iter()
            .zip(scores.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        scores = next;
        if delta < CONVERGENCE_EPSILON {
            break;
        }
    }

    let id_by_idx: Vec<(&String, usize)> = universe.iter().map(|(k, v)| (k, *v)).collect();
    let mut ranked: Vec<(String, f32)> = id_by_idx
        .into_iter()
        .map(|(id, idx)| (id.clone(), scores[idx]))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(top_k);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds(pairs: &[(&str, f32)]) -> HashMap<String, f32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn rejects_unnormalised_seeds() {
        let adj = Adjacency::new();
        let err = ppr(&seeds(&[("a", 0.5)]), 0.85, 10, &adj).unwrap_err();
        assert!(matches!(err, GraphError::InvalidSeedWeights(_)));
    }

    #[test]
    fn single_seed_no_edges_stays_at_seed() {
        let adj = Adjacency::new();
        let result = ppr(&seeds(&[("a", 1.0)]), 0.85, 10, &adj).unwrap();
        assert_eq!(result[0].0, "a");
        assert!(result[0].1 > 0.99);
    }

    #[test]
    fn mass_propagates_along_edges() {
        let mut adj = Adjacency::new();
        adj.add_edge("a", "b", 1.0);
        let result = ppr(&seeds(&[("a", 1.0)]), 0.85, 10, &adj).unwrap();
        let b_score = result.iter().find(|(id, _)| id == "b").unwrap().1;
        assert!(b_score > 0.0);
        let a_score = result.iter().find(|(id, _)| id == "a").unwrap().1;
        assert!(a_score > b_score, "teleportation should keep a ahead of b");
    }

    #[test]
    fn higher_damping_drifts_further() {
        let mut adj = Adjacency::new();
        adj.add_edge("a", "b", 1.0);
        adj.add_edge("b", "c", 1.0);

        let low = ppr(&seeds(&[("a", 1.0)]), 0.5, 10, &adj).unwrap();
        let high = ppr(&seeds(&[("a", 1.0)]), 0.9, 10, &adj).unwrap();

        let c_low = low.iter().find(|(id, _)| id == "c").unwrap().1;
        let c_high = high.iter().find(|(id, _)| id == "c").unwrap().1;
        assert!(c_high > c_low);
    }

    #[test]
    fn top_k_truncates_and_is_deterministic() {
        let mut adj = Adjacency::new();
        adj.add_edge("a", "b", 1.0);
        adj.add_edge("a", "c", 1.0);
        adj.add_edge("a", "d", 1.0);
        let result = ppr(&seeds(&[("a", 1.0)]), 0.85, 2, &adj).unwrap();
        assert_eq!(result.len(), 2);
    }
}
