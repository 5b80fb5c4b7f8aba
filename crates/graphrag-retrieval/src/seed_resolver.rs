//! The Seed Resolver (§4.3): translates a query into a weighted probability
//! distribution over entity nodes for PPR teleportation. Three tiers run
//! concurrently and merge at one commutative join point, per the "parallel
//! merges are commutative" design note in §9 — each tier only ever produces
//! its own independent weight map, never touching another tier's state.

use std::collections::{HashMap, HashSet};

use graphrag_embedding::EmbeddingGateway;
use graphrag_graph::types::{DeterministicEdgeKind, Node, Section, TextChunk};
use graphrag_graph::vectors::{COMMUNITY_SUMMARY_EMBEDDING_V2, SENTENCE_EMBEDDINGS_V2};
use graphrag_graph::GraphStore;

use crate::entity_resolution::{entities_in_group, resolve_surface_form};
use crate::error::RetrievalError;
use crate::ner::EntityExtractor;
use crate::types::WeightProfile;

const T1_MAX_ENTITIES: usize = 8;
const T2_SENTENCE_TOP_K: usize = 30;
const T2_MIN_HITS_PER_SECTION: usize = 2;
const T3_TOP_COMMUNITIES: usize = 3;

/// A resolved, normalized teleportation vector plus the damping factor the
/// calling route should use for PPR.
#[derive(Debug, Clone)]
pub struct SeedSet {
    pub weights: HashMap<String, f32>,
    pub damping: f32,
}

pub struct SeedResolver<'a> {
    pub graph: &'a GraphStore,
    pub embeddings: &'a EmbeddingGateway,
    pub entity_extractor: &'a dyn EntityExtractor,
}

impl<'a> SeedResolver<'a> {
    pub fn new(
        graph: &'a GraphStore,
        embeddings: &'a EmbeddingGateway,
        entity_extractor: &'a dyn EntityExtractor,
    ) -> Self {
        Self { graph, embeddings, entity_extractor }
    }

    pub async fn resolve(
        &self,
        query: &str,
        group_id: &str,
        profile: WeightProfile,
    ) -> Result<SeedSet, RetrievalError> {
        // Tiers are independent of each other; none reads another's output,
        // so they can run concurrently (§9). `tokio::join!` suspends at each
        // internal await point the same as three separately-spawned tasks
        // would, without needing a task handle per tier.
        let (t1, t2, t3) = tokio::join!(
            self.resolve_t1(query, group_id),
            self.resolve_t2(query, group_id),
            self.resolve_t3(query, group_id),
        );
        let t1 = t1?;
        let t2 = t2?;
        let t3 = t3?;

        if t1.is_empty() && t2.is_empty() && t3.is_empty() {
            return Err(RetrievalError::EmptySeedSet(query.to_string()));
        }

        // §4.3 edge case: an abstract query with no sentence-vector hits
        // redistributes T2's budget into T3 before shares are computed.
        let (w2, w3) = if t2.is_empty() { (0.0, profile.w2 + profile.w3) } else { (profile.w2, profile.w3) };

        let mut merged: HashMap<String, f32> = HashMap::new();
        accumulate_tier(&mut merged, &t1, profile.w1);
        accumulate_tier(&mut merged, &t2, w2);
        accumulate_tier(&mut merged, &t3, w3);

        let total: f32 = merged.values().sum();
        if total > 0.0 {
            for weight in merged.values_mut() {
                *weight /= total;
            }
        }

        Ok(SeedSet { weights: merged, damping: profile.damping() })
    }

    /// T1 — entity seeds. NER runs on the *original* query (never a
    /// decomposed sub-question, per §4.3) and each surface form is resolved
    /// against the Entity table, capped at 8 entities.
    async fn resolve_t1(&self, query: &str, group_id: &str) -> Result<Vec<String>, RetrievalError> {
        let surface_forms = self.entity_extractor.extract_surface_forms(query);
        let mut entities = Vec::new();
        for form in surface_forms {
            if entities.len() >= T1_MAX_ENTITIES {
                break;
            }
            if let Some(entity_id) = resolve_surface_form(self.graph, self.embeddings, group_id, &form).await? {
                if !entities.contains(&entity_id) {
                    entities.push(entity_id);
                }
            }
        }
        Ok(entities)
    }

    /// T2 — structural seeds, derived from sentence-vector hits rather than
    /// embedded directly. Sections with ≥2 hits are anchors; entities
    /// mentioned by chunks in an anchor section are the tier's output.
    async fn resolve_t2(&self, query: &str, group_id: &str) -> Result<Vec<String>, RetrievalError> {
        let query_vector = self.embeddings.embed_query(query).await?;
        let hits = self.graph.search_vectors(SENTENCE_EMBEDDINGS_V2, group_id, &query_vector.vector, T2_SENTENCE_TOP_K)?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let nodes = self.graph.scan_nodes(group_id)?;
        let mut hit_ids: HashSet<&str> = HashSet::new();
        for hit in &hits {
            hit_ids.insert(hit.node_id.as_str());
        }

        let mut counts_by_section: HashMap<String, usize> = HashMap::new();
        for node in &nodes {
            if let Node::Sentence(s) = node {
                if hit_ids.contains(s.id.as_str()) {
                    *counts_by_section.entry(s.section_path.clone()).or_insert(0) += 1;
                }
            }
        }

        let anchor_paths: HashSet<&String> = counts_by_section
            .iter()
            .filter(|(_, count)| **count >= T2_MIN_HITS_PER_SECTION)
            .map(|(path, _)| path)
            .collect();
        if anchor_paths.is_empty() {
            return Ok(Vec::new());
        }

        let sections: Vec<&Section> = nodes
            .iter()
            .filter_map(|n| match n {
                Node::Section(s) if anchor_paths.contains(&s.path_key) => Some(s),
                _ => None,
            })
            .collect();
        let anchor_section_ids: HashSet<&str> = sections.iter().map(|s| s.id.as_str()).collect();

        let chunks: Vec<&TextChunk> = nodes
            .iter()
            .filter_map(|n| match n {
                Node::TextChunk(c) => Some(c),
                _ => None,
            })
            .filter(|c| c.section_id.as_deref().is_some_and(|id| anchor_section_ids.contains(id)))
            .collect();

        let mut entities = Vec::new();
        for chunk in chunks {
            for edge in self.graph.get_deterministic_edges(group_id, &chunk.id, DeterministicEdgeKind::Mentions)? {
                if !entities.contains(&edge.to) {
                    entities.push(edge.to);
                }
            }
        }
        Ok(entities)
    }

    /// T3 — thematic seeds from the top-m community summaries' member
    /// entities.
    async fn resolve_t3(&self, query: &str, group_id: &str) -> Result<Vec<String>, RetrievalError> {
        let query_vector = self.embeddings.embed_query(query).await?;
        let hits = self.graph.search_vectors(
            COMMUNITY_SUMMARY_EMBEDDING_V2,
            group_id,
            &query_vector.vector,
            T3_TOP_COMMUNITIES,
        )?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let nodes = self.graph.scan_nodes(group_id)?;
        let hit_ids: HashSet<&str> = hits.iter().map(|h| h.node_id.as_str()).collect();

        let mut entities = Vec::new();
        for node in &nodes {
            if let Node::Community(c) = node {
                if hit_ids.contains(c.id.as_str()) {
                    for member in &c.member_entity_ids {
                        if !entities.contains(member) {
                            entities.push(member.clone());
                        }
                    }
                }
            }
        }
        Ok(entities)
    }
}

/// Splits `budget` equally across `entities` and adds each entity's share
/// into `merged`, so an entity present in multiple tiers accumulates the sum
/// of its per-tier shares (§4.3).
fn accumulate_tier(merged: &mut HashMap<String, f32>, entities: &[String], budget: f32) {
    if entities.is_empty() || budget <= 0.0 {
        return;
    }
    let share = budget / entities.len() as f32;
    for entity_id in entities {
        *merged.entry(entity_id.clone()).or_insert(0.0) += share;
    }
}

/// Surfaces the Entity table for callers that need it outside resolution
/// (e.g. the drift route's per-subquery union). Thin re-export so route code
/// doesn't reach into `entity_resolution` directly.
pub fn known_entity_ids(graph: &GraphStore, group_id: &str) -> Result<Vec<String>, RetrievalError> {
    Ok(entities_in_group(graph, group_id)?.into_iter().map(|e| e.id).collect())
}
