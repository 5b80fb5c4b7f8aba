//! # Graph Store
//!
//! The persistent labeled property graph plus vector indexes that every
//! retrieval route reads from. Stores `Document`, `Section`, `TextChunk`,
//! `Sentence`, `Entity`, and `Community` nodes; deterministic edges written
//! once from parsed structure, and probabilistic edges written only by
//! k-NN and bounded by a sparsity budget.
//!
//! ## Layout
//!
//! - [`ann`] / [`vectors`] — the four named, per-group vector indexes
//!   (`sentence_embeddings_v2`, `entity_embedding_v2`, `chunk_embedding_v2`,
//!   `community_summary_embedding_v2`).
//! - [`ppr`] — Personalized PageRank over the entity/community adjacency.
//! - [`beam`] — bounded beam search over the probabilistic edge families.
//! - [`knn`] — the sentence- and entity-level k-NN edge builders.
//! - [`state`] — the per-group indexing state machine.
//! - [`backend`] — the pluggable key-value backend (redb or in-memory).
//!
//! ## Example
//!
//! ```
//! use graphrag_graph::{GraphStore, GraphStoreConfig};
//! use graphrag_graph::types::{Document, Node};
//!
//! let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
//! let doc = Document {
//!     id: "doc-1".into(),
//!     group_id: "tenant-a".into(),
//!     title: "Sample Contract".into(),
//!     page_count: 4,
//! };
//! store.put_node(Node::Document(doc)).unwrap();
//! assert!(store.get_node("tenant-a", "doc-1").unwrap().is_some());
//! ```

pub mod ann;
pub mod backend;
pub mod beam;
pub mod community;
pub mod error;
pub mod knn;
pub mod ppr;
pub mod state;
pub mod types;
pub mod vectors;

use std::collections::HashMap;
use std::sync::RwLock;

pub use ann::AnnConfig;
pub use backend::{BackendConfig, GraphBackend, InMemoryBackend};
#[cfg(feature = "backend-redb")]
pub use backend::RedbBackend;
pub use error::GraphError;
pub use ppr::Adjacency;
pub use state::IndexingState;
pub use types::{
    DeterministicEdge, DeterministicEdgeKind, Node, NodeLabel, ProbabilisticEdge,
    ProbabilisticEdgeKind, EMBEDDING_DIM,
};
pub use vectors::{VectorHit, VectorIndexRegistry};

#[derive(Clone, Debug, Default)]
pub struct GraphStoreConfig {
    pub backend: BackendConfig,
    pub ann: AnnConfig,
}

fn node_key(group_id: &str, node_id: &str) -> String {
    format!("{group_id}:node:{node_id}")
}

fn det_edge_key(group_id: &str, from: &str, kind: DeterministicEdgeKind) -> String {
    format!("{group_id}:detedge:{from}:{kind:?}")
}

fn prob_edge_key(group_id: &str, from: &str, kind: ProbabilisticEdgeKind) -> String {
    format!("{group_id}:probedge:{from}:{kind:?}")
}

/// Ties together node storage, edge adjacency, the named vector indexes,
/// and the per-group indexing state machine. This is the single entry
/// point every route handler and the indexing pipeline talk to.
pub struct GraphStore {
    backend: Box<dyn GraphBackend>,
    pub vectors: VectorIndexRegistry,
    // Cached adjacency for PPR / beam search, rebuilt from the backend when
    // a route needs it. Keyed by group_id — the store is shared across
    // tenants (one `Arc<GraphStore>` in the server), so a single unkeyed
    // slot would leak one group's edges into another group's PPR. Kept
    // behind a lock since it's read-mostly and rebuilt infrequently (after
    // an indexing run), never mutated concurrently with a query per the
    // read-only-during-retrieval shared-resource policy.
    adjacency_cache: RwLock<HashMap<String, Adjacency>>,
}

impl GraphStore {
    pub fn new(cfg: GraphStoreConfig) -> Result<Self, GraphError> {
        let backend = cfg.backend.build()?;
        Ok(Self {
            backend,
            vectors: VectorIndexRegistry::new(cfg.ann),
            adjacency_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_backend(backend: Box<dyn GraphBackend>, ann: AnnConfig) -> Self {
        Self {
            backend,
            vectors: VectorIndexRegistry::new(ann),
            adjacency_cache: RwLock::new(HashMap::new()),
        }
    }

    // ---- Node storage ----

    pub fn put_node(&self, node: Node) -> Result<(), GraphError> {
        let key = node_key(node.group_id(), node.id());
        let bytes = serde_json::to_vec(&node)?;
        self.backend.put(&key, &bytes)?;
        if let Node::Sentence(ref s) = node {
            self.vectors.upsert(
                vectors::SENTENCE_EMBEDDINGS_V2,
                &s.group_id,
                &s.id,
                &s.embedding_v2,
            )?;
        }
        if let Node::Entity(ref e) = node {
            self.vectors
                .upsert(vectors::ENTITY_EMBEDDING_V2, &e.group_id, &e.id, &e.embedding_v2)?;
        }
        if let Node::TextChunk(ref c) = node {
            self.vectors
                .upsert(vectors::CHUNK_EMBEDDING_V2, &c.group_id, &c.id, &c.embedding_v2)?;
        }
        if let Node::Community(ref c) = node {
            if c.summary_embedding_v2.len() != EMBEDDING_DIM {
                return Err(GraphError::DimensionMismatch {
                    expected: EMBEDDING_DIM,
                    got: c.summary_embedding_v2.len(),
                });
            }
            self.vectors.upsert(
                vectors::COMMUNITY_SUMMARY_EMBEDDING_V2,
                &c.group_id,
                &c.id,
                &c.summary_embedding_v2,
            )?;
        }
        Ok(())
    }

    pub fn get_node(&self, group_id: &str, node_id: &str) -> Result<Option<Node>, GraphError> {
        match self.backend.get(&node_key(group_id, node_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn scan_nodes(&self, group_id: &str) -> Result<Vec<Node>, GraphError> {
        let prefix = format!("{group_id}:node:");
        let mut out = Vec::new();
        self.backend.scan_prefix(&prefix, &mut |_k, v| {
            out.push(serde_json::from_slice(v)?);
            Ok(())
        })?;
        Ok(out)
    }

    // ---- Deterministic edges ----

    /// Writes a deterministic edge. Never called from similarity code paths
    /// — only from the ingestion pipeline, which is what keeps this family
    /// exact and complete per the edge invariants in §3.
    pub fn put_deterministic_edge(
        &self,
        group_id: &str,
        edge: DeterministicEdge,
    ) -> Result<(), GraphError> {
        let key = det_edge_key(group_id, &edge.from, edge.kind);
        let mut existing = self.get_deterministic_edges(group_id, &edge.from, edge.kind)?;
        existing.push(edge);
        let bytes = serde_json::to_vec(&existing)?;
        self.backend.put(&key, &bytes)
    }

    pub fn get_deterministic_edges(
        &self,
        group_id: &str,
        from: &str,
        kind: DeterministicEdgeKind,
    ) -> Result<Vec<DeterministicEdge>, GraphError> {
        match self.backend.get(&det_edge_key(group_id, from, kind))? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    // ---- Probabilistic edges ----

    pub fn put_probabilistic_edges(
        &self,
        group_id: &str,
        edges: Vec<ProbabilisticEdge>,
    ) -> Result<(), GraphError> {
        let node_count = self.scan_nodes(group_id)?.len();
        let existing_count = self.scan_probabilistic_edges(group_id)?.len();
        knn::check_sparsity_budget(existing_count + edges.len(), node_count, group_id)?;

        let mut by_from: std::collections::HashMap<(String, ProbabilisticEdgeKind), Vec<ProbabilisticEdge>> =
            std::collections::HashMap::new();
        for edge in edges {
            by_from
                .entry((edge.from.clone(), edge.kind))
                .or_default()
                .push(edge);
        }
        for ((from, kind), mut new_edges) in by_from {
            let key = prob_edge_key(group_id, &from, kind);
            let mut existing: Vec<ProbabilisticEdge> = match self.backend.get(&key)? {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => Vec::new(),
            };
            existing.append(&mut new_edges);
            self.backend.put(&key, &serde_json::to_vec(&existing)?)?;
        }
        // Invalidate this group's cached adjacency; it's rebuilt lazily on next use.
        self.adjacency_cache
            .write()
            .map_err(|_| GraphError::backend("poisoned lock"))?
            .remove(group_id);
        Ok(())
    }

    pub fn scan_probabilistic_edges(&self, group_id: &str) -> Result<Vec<ProbabilisticEdge>, GraphError> {
        let prefix = format!("{group_id}:probedge:");
        let mut out = Vec::new();
        self.backend.scan_prefix(&prefix, &mut |_k, v| {
            let mut edges: Vec<ProbabilisticEdge> = serde_json::from_slice(v)?;
            out.append(&mut edges);
            Ok(())
        })?;
        Ok(out)
    }

    // ---- PPR ----

    /// `ppr(seed_weights, damping, top_k, group_id)`. Builds (and caches)
    /// the entity/community adjacency from deterministic `BELONGS_TO` and
    /// probabilistic edges, then runs power-iteration PPR.
    pub fn ppr(
        &self,
        seed_weights: &std::collections::HashMap<String, f32>,
        damping: f32,
        top_k: usize,
        group_id: &str,
    ) -> Result<Vec<(String, f32)>, GraphError> {
        let adjacency = self.build_adjacency(group_id)?;
        ppr::ppr(seed_weights, damping, top_k, &adjacency)
    }

    fn build_adjacency(&self, group_id: &str) -> Result<Adjacency, GraphError> {
        {
            let cache = self
                .adjacency_cache
                .read()
                .map_err(|_| GraphError::backend("poisoned lock"))?;
            if let Some(adj) = cache.get(group_id) {
                return Ok(adj.clone());
            }
        }
        let mut adjacency = Adjacency::new();
        for edge in self.scan_probabilistic_edges(group_id)? {
            adjacency.add_edge(&edge.from, &edge.to, edge.similarity);
        }
        let mut cache = self
            .adjacency_cache
            .write()
            .map_err(|_| GraphError::backend("poisoned lock"))?;
        cache.insert(group_id.to_string(), adjacency.clone());
        Ok(adjacency)
    }

    // ---- Community detection ----

    /// Partitions every `Entity` node in `group_id` into communities via
    /// label propagation over `SEMANTICALLY_SIMILAR` edges (§4.2's
    /// `CommunitiesDetected` state). Summarization and re-embedding of the
    /// resulting member lists into `Community` nodes happens one layer up,
    /// in the indexing pipeline, since this crate has no LLM dependency.
    pub fn detect_communities(&self, group_id: &str) -> Result<Vec<Vec<String>>, GraphError> {
        let entity_ids: Vec<String> = self
            .scan_nodes(group_id)?
            .into_iter()
            .filter_map(|n| match n {
                Node::Entity(e) => Some(e.id),
                _ => None,
            })
            .collect();
        let edges = self.scan_probabilistic_edges(group_id)?;
        Ok(community::detect_communities(&entity_ids, &edges))
    }

    // ---- Beam search ----

    pub fn semantic_beam(
        &self,
        start_entities: &[String],
        hops: usize,
        beam_width: usize,
        group_id: &str,
    ) -> Result<Vec<beam::BeamPath>, GraphError> {
        let edges = self.scan_probabilistic_edges(group_id)?;
        Ok(beam::semantic_beam(start_entities, hops, beam_width, &edges))
    }

    // ---- Vector search passthrough ----

    pub fn search_vectors(
        &self,
        index_name: &str,
        group_id: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<VectorHit>, GraphError> {
        self.vectors.search(index_name, group_id, query, k)
    }

    // ---- State machine passthrough ----

    pub fn indexing_state(&self, group_id: &str) -> Result<IndexingState, GraphError> {
        state::read_state(self.backend.as_ref(), group_id)
    }

    pub fn transition_indexing_state(
        &self,
        group_id: &str,
        target: IndexingState,
    ) -> Result<(), GraphError> {
        state::transition(self.backend.as_ref(), group_id, target)
    }

    pub fn flush(&self) -> Result<(), GraphError> {
        self.backend.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn sentence(id: &str, group: &str, chunk: &str, emb_seed: f32) -> Node {
        let mut emb = vec![0.0f32; EMBEDDING_DIM];
        emb[0] = emb_seed;
        Node::Sentence(Sentence {
            id: id.into(),
            group_id: group.into(),
            chunk_id: chunk.into(),
            paragraph_id: "p1".into(),
            section_path: "Terms > Payment".into(),
            parent_paragraph_text: "full paragraph".into(),
            page: 1,
            confidence: 0.95,
            char_offset: 0,
            char_len: 10,
            geometry: vec![],
            embedding_v2: emb,
            source: SentenceSource::Paragraph,
            text: "The total was $29,900.00.".into(),
            next_sentence_id: None,
            prev_sentence_id: None,
        })
    }

    #[test]
    fn put_and_get_node_roundtrips() {
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        store.put_node(sentence("s1", "g1", "c1", 1.0)).unwrap();
        let fetched = store.get_node("g1", "s1").unwrap().unwrap();
        assert_eq!(fetched.id(), "s1");
    }

    #[test]
    fn cross_tenant_lookup_returns_none() {
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        store.put_node(sentence("s1", "g1", "c1", 1.0)).unwrap();
        assert!(store.get_node("g2", "s1").unwrap().is_none());
    }

    #[test]
    fn sentence_insert_populates_vector_index() {
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        store.put_node(sentence("s1", "g1", "c1", 1.0)).unwrap();
        let mut query = vec![0.0f32; EMBEDDING_DIM];
        query[0] = 1.0;
        let hits = store
            .search_vectors(vectors::SENTENCE_EMBEDDINGS_V2, "g1", &query, 5)
            .unwrap();
        assert_eq!(hits[0].node_id, "s1");
    }

    #[test]
    fn deterministic_edges_are_exact() {
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        store
            .put_deterministic_edge(
                "g1",
                DeterministicEdge {
                    kind: DeterministicEdgeKind::PartOf,
                    from: "s1".into(),
                    to: "c1".into(),
                },
            )
            .unwrap();
        let edges = store
            .get_deterministic_edges("g1", "s1", DeterministicEdgeKind::PartOf)
            .unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, "c1");
    }

    #[test]
    fn sparsity_budget_rejects_excess_probabilistic_edges() {
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        store.put_node(sentence("s1", "g1", "c1", 1.0)).unwrap();
        store.put_node(sentence("s2", "g1", "c2", 0.99)).unwrap();

        let over_budget: Vec<ProbabilisticEdge> = (0..10)
            .map(|i| ProbabilisticEdge {
                kind: ProbabilisticEdgeKind::RelatedTo,
                from: "s1".into(),
                to: format!("x{i}"),
                method: SimilarityMethod::CosineKnn,
                similarity: 0.95,
            })
            .collect();
        let err = store.put_probabilistic_edges("g1", over_budget).unwrap_err();
        assert!(matches!(err, GraphError::SparsityBudgetExceeded { .. }));
    }

    #[test]
    fn detect_communities_groups_connected_entities() {
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        for id in ["e1", "e2", "e3"] {
            store
                .put_node(Node::Entity(Entity {
                    id: id.into(),
                    group_id: "g1".into(),
                    canonical_name: id.into(),
                    aliases: vec![],
                    embedding_v2: vec![0.0; EMBEDDING_DIM],
                }))
                .unwrap();
        }
        store
            .put_probabilistic_edges(
                "g1",
                vec![ProbabilisticEdge {
                    kind: ProbabilisticEdgeKind::SemanticallySimilar,
                    from: "e1".into(),
                    to: "e2".into(),
                    method: SimilarityMethod::CosineKnn,
                    similarity: 0.8,
                }],
            )
            .unwrap();
        let communities = store.detect_communities("g1").unwrap();
        assert_eq!(communities.len(), 2);
        assert!(communities.iter().any(|c| c.len() == 2));
    }

    #[test]
    fn ppr_runs_over_stored_probabilistic_edges() {
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        store
            .put_probabilistic_edges(
                "g1",
                vec![ProbabilisticEdge {
                    kind: ProbabilisticEdgeKind::SemanticallySimilar,
                    from: "e1".into(),
                    to: "e2".into(),
                    method: SimilarityMethod::CosineKnn,
                    similarity: 0.8,
                }],
            )
            .unwrap();
        let seeds = std::collections::HashMap::from([("e1".to_string(), 1.0f32)]);
        let result = store.ppr(&seeds, 0.85, 10, "g1").unwrap();
        assert!(result.iter().any(|(id, _)| id == "e2"));
    }

    #[test]
    fn adjacency_cache_is_isolated_per_group() {
        // Regression test: the cache used to be a single unkeyed slot, so
        // the first group to run PPR after indexing poisoned every other
        // group's results with its own edges.
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        store
            .put_probabilistic_edges(
                "g1",
                vec![ProbabilisticEdge {
                    kind: ProbabilisticEdgeKind::SemanticallySimilar,
                    from: "a1".into(),
                    to: "a2".into(),
                    method: SimilarityMethod::CosineKnn,
                    similarity: 0.8,
                }],
            )
            .unwrap();
        store
            .put_probabilistic_edges(
                "g2",
                vec![ProbabilisticEdge {
                    kind: ProbabilisticEdgeKind::SemanticallySimilar,
                    from: "b1".into(),
                    to: "b2".into(),
                    method: SimilarityMethod::CosineKnn,
                    similarity: 0.8,
                }],
            )
            .unwrap();

        // Populate g1's cache first.
        let g1_seeds = std::collections::HashMap::from([("a1".to_string(), 1.0f32)]);
        let g1_result = store.ppr(&g1_seeds, 0.85, 10, "g1").unwrap();
        assert!(g1_result.iter().any(|(id, _)| id == "a2"));

        // g2's PPR must reflect g2's own edges, not g1's cached adjacency.
        let g2_seeds = std::collections::HashMap::from([("b1".to_string(), 1.0f32)]);
        let g2_result = store.ppr(&g2_seeds, 0.85, 10, "g2").unwrap();
        assert!(g2_result.iter().any(|(id, _)| id == "b2"));
        assert!(!g2_result.iter().any(|(id, _)| id == "a1" || id == "a2"));
    }
}
