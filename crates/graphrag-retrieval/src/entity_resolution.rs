//! Resolves a free-text surface form against the Entity table (§4.3 T1).
//!
//! Tried in order — exact, alias, fuzzy, semantic — and the first hit wins.
//! The tiers are listed in the spec as a fallback chain, not a union: an
//! exact canonical match is never second-guessed by a looser one.

use graphrag_embedding::EmbeddingGateway;
use graphrag_graph::types::{Entity, Node};
use graphrag_graph::vectors::ENTITY_EMBEDDING_V2;
use graphrag_graph::GraphStore;

use crate::error::RetrievalError;

const FUZZY_MAX_DISTANCE: usize = 2;
const FUZZY_MIN_LEN: usize = 5;
const SEMANTIC_SIMILARITY_THRESHOLD: f32 = 0.75;

/// Resolves one surface form to at most one entity id, trying exact,
/// alias, fuzzy (edit-distance ≤ 2 for strings ≥ 5 chars), then semantic
/// (cosine ≥ 0.75 against `entity_embedding_v2`) matches in that order.
pub async fn resolve_surface_form(
    graph: &GraphStore,
    embeddings: &EmbeddingGateway,
    group_id: &str,
    surface_form: &str,
) -> Result<Option<String>, RetrievalError> {
    let entities = entities_in_group(graph, group_id)?;
    let needle = surface_form.trim();
    if needle.is_empty() {
        return Ok(None);
    }

    if let Some(entity) = entities.iter().find(|e| e.canonical_name.eq_ignore_ascii_case(needle)) {
        return Ok(Some(entity.id.clone()));
    }

    if let Some(entity) = entities
        .iter()
        .find(|e| e.aliases.iter().any(|a| a.eq_ignore_ascii_case(needle)))
    {
        return Ok(Some(entity.id.clone()));
    }

    if needle.chars().count() >= FUZZY_MIN_LEN {
        if let Some(entity) = entities.iter().find(|e| {
            levenshtein(&e.canonical_name.to_ascii_lowercase(), &needle.to_ascii_lowercase())
                <= FUZZY_MAX_DISTANCE
        }) {
            return Ok(Some(entity.id.clone()));
        }
    }

    let query_vector = embeddings.embed_query(needle).await?;
    let hits = graph.search_vectors(ENTITY_EMBEDDING_V2, group_id, &query_vector.vector, 1)?;
    if let Some(hit) = hits.into_iter().find(|h| h.score >= SEMANTIC_SIMILARITY_THRESHOLD) {
        return Ok(Some(hit.node_id));
    }

    Ok(None)
}

pub(crate) fn entities_in_group(graph: &GraphStore, group_id: &str) -> Result<Vec<Entity>, RetrievalError> {
    Ok(graph
        .scan_nodes(group_id)?
        .into_iter()
        .filter_map(|n| match n {
            Node::Entity(e) => Some(e),
            _ => None,
        })
        .collect())
}

/// Classic Wagner-Fischer edit distance. `entities_in_group` is the only
/// other tenant-scoped call in the fuzzy path, so this never compares
/// across groups.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    let mut row: Vec<usize> = (0..=m).collect();

    for i in 1..=n {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=m {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }
    row[m]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_identical_strings_is_zero() {
        assert_eq!(levenshtein("acme corp", "acme corp"), 0);
    }

    #[test]
    fn levenshtein_counts_single_edits() {
        assert_eq!(levenshtein("acme corp", "acme corp."), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }
}
