//! Named, per-group vector indexes.
//!
//! The store exposes four named indexes — `sentence_embeddings_v2`,
//! `entity_embedding_v2`, `chunk_embedding_v2`, `community_summary_embedding_v2`
//! — each an independent [`AnnIndex`] scoped to one `group_id` so a vector
//! from one tenant can never surface in another tenant's search.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::ann::{AnnConfig, AnnIndex};
use crate::error::GraphError;
use crate::types::EMBEDDING_DIM;

pub const SENTENCE_EMBEDDINGS_V2: &str = "sentence_embeddings_v2";
pub const ENTITY_EMBEDDING_V2: &str = "entity_embedding_v2";
pub const CHUNK_EMBEDDING_V2: &str = "chunk_embedding_v2";
pub const COMMUNITY_SUMMARY_EMBEDDING_V2: &str = "community_summary_embedding_v2";

/// One (index_name, group_id) pair's worth of vectors.
struct GroupIndex {
    ann: AnnIndex,
}

/// Registry of named vector indexes, each partitioned by group.
pub struct VectorIndexRegistry {
    ann_config: AnnConfig,
    // keyed by (index_name, group_id)
    indexes: RwLock<HashMap<(String, String), GroupIndex>>,
}

#[derive(Debug, Clone)]
pub struct VectorHit {
    pub node_id: String,
    pub score: f32,
}

impl VectorIndexRegistry {
    pub fn new(ann_config: AnnConfig) -> Self {
        Self {
            ann_config,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    fn known_index(name: &str) -> bool {
        matches!(
            name,
            SENTENCE_EMBEDDINGS_V2
                | ENTITY_EMBEDDING_V2
                | CHUNK_EMBEDDING_V2
                | COMMUNITY_SUMMARY_EMBEDDING_V2
        )
    }

    /// Insert or replace a vector. Fails fatally (never silently) on a
    /// dimension mismatch or an unrecognised index name.
    pub fn upsert(
        &self,
        index_name: &str,
        group_id: &str,
        node_id: &str,
        embedding: &[f32],
    ) -> Result<(), GraphError> {
        if !Self::known_index(index_name) {
            return Err(GraphError::IndexMissing(index_name.to_string()));
        }
        if embedding.len() != EMBEDDING_DIM {
            return Err(GraphError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                got: embedding.len(),
            });
        }

        let mut indexes = self
            .indexes
            .write()
            .map_err(|_| GraphError::backend("poisoned lock"))?;
        let key = (index_name.to_string(), group_id.to_string());
        let entry = indexes.entry(key).or_insert_with(|| GroupIndex {
            ann: AnnIndex::new(EMBEDDING_DIM, self.ann_config),
        });
        entry
            .ann
            .insert(node_id.to_string(), embedding.to_vec())
            .map_err(|e| GraphError::backend(e.to_string()))?;
        entry.ann.rebuild();
        Ok(())
    }

    /// `search_vectors(index_name, query_vector, k, group_id)`. Returns hits
    /// sorted descending by cosine similarity. Fails with `IndexMissing`
    /// rather than an empty list when the index has never been populated for
    /// this group — an empty corpus is represented by an explicit "no
    /// evidence" decision upstream, not by a quietly-absent index.
    pub fn search(
        &self,
        index_name: &str,
        group_id: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<VectorHit>, GraphError> {
        if !Self::known_index(index_name) {
            return Err(GraphError::IndexMissing(index_name.to_string()));
        }
        if query.len() != EMBEDDING_DIM {
            return Err(GraphError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                got: query.len(),
            });
        }

        let indexes = self
            .indexes
            .read()
            .map_err(|_| GraphError::backend("poisoned lock"))?;
        let key = (index_name.to_string(), group_id.to_string());
        let Some(entry) = indexes.get(&key) else {
            return Err(GraphError::IndexMissing(format!(
                "{index_name} has no vectors for group {group_id}"
            )));
        };

        let results = entry
            .ann
            .search(query, k)
            .map_err(|e| GraphError::backend(e.to_string()))?;

        let mut hits: Vec<VectorHit> = results
            .into_iter()
            .filter_map(|r| {
                entry.ann.get_id(r.index).map(|id| VectorHit {
                    node_id: id.clone(),
                    score: 1.0 - r.distance.clamp(0.0, 2.0),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        Ok(hits)
    }

    pub fn len(&self, index_name: &str, group_id: &str) -> usize {
        let indexes = self.indexes.read().expect("lock poisoned");
        indexes
            .get(&(index_name.to_string(), group_id.to_string()))
            .map(|e| e.ann.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2048(seed: f32) -> Vec<f32> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        v[0] = seed;
        v[1] = 1.0;
        v
    }

    #[test]
    fn unknown_index_is_missing_not_empty() {
        let reg = VectorIndexRegistry::new(AnnConfig::default());
        let err = reg
            .search("not_a_real_index", "g1", &vec2048(1.0), 5)
            .unwrap_err();
        assert!(matches!(err, GraphError::IndexMissing(_)));
    }

    #[test]
    fn never_built_index_is_missing_not_empty() {
        let reg = VectorIndexRegistry::new(AnnConfig::default());
        let err = reg
            .search(SENTENCE_EMBEDDINGS_V2, "g1", &vec2048(1.0), 5)
            .unwrap_err();
        assert!(matches!(err, GraphError::IndexMissing(_)));
    }

    #[test]
    fn dimension_mismatch_on_upsert_is_fatal() {
        let reg = VectorIndexRegistry::new(AnnConfig::default());
        let err = reg
            .upsert(SENTENCE_EMBEDDINGS_V2, "g1", "s1", &[1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, GraphError::DimensionMismatch { .. }));
    }

    #[test]
    fn groups_are_isolated() {
        let reg = VectorIndexRegistry::new(AnnConfig::default().with_min_vectors_for_ann(1));
        reg.upsert(SENTENCE_EMBEDDINGS_V2, "g1", "s1", &vec2048(5.0))
            .unwrap();

        // g2 never received any vectors: must be IndexMissing, not empty.
        let err = reg
            .search(SENTENCE_EMBEDDINGS_V2, "g2", &vec2048(5.0), 5)
            .unwrap_err();
        assert!(matches!(err, GraphError::IndexMissing(_)));

        let hits = reg
            .search(SENTENCE_EMBEDDINGS_V2, "g1", &vec2048(5.0), 5)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_id, "s1");
    }

    #[test]
    fn results_sorted_descending() {
        let reg = VectorIndexRegistry::new(AnnConfig::default().with_min_vectors_for_ann(1));
        reg.upsert(ENTITY_EMBEDDING_V2, "g1", "close", &vec2048(5.0))
            .unwrap();
        reg.upsert(ENTITY_EMBEDDING_V2, "g1", "far", &vec2048(-5.0))
            .unwrap();

        let hits = reg
            .search(ENTITY_EMBEDDING_V2, "g1", &vec2048(5.0), 2)
            .unwrap();
        assert_eq!(hits[0].node_id, "close");
        assert!(hits[0].score >= hits[1].score);
    }
}
