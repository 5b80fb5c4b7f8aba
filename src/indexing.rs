//! The indexing pipeline (§4.2): turns one [`RawDocument`] into a fully
//! embedded, community-summarized subgraph for its `group_id`, advancing
//! that group's [`IndexingState`] one declared transition at a time.
//!
//! Each stage does the minimum work its target state requires and persists
//! before transitioning, so a crash mid-run resumes (on the next call with
//! the same document) from the last state actually reached rather than
//! re-doing completed work silently twice.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use graphrag_embedding::{EmbeddingError, EmbeddingGateway};
use graphrag_graph::knn::{
    build_entity_knn_edges, build_sentence_knn_edges, EntityVector, SentenceVector,
    ENTITY_KNN_SIMILARITY_CUTOFF_DEFAULT, ENTITY_KNN_TOP_K_DEFAULT, SENTENCE_KNN_MAX_K_DEFAULT,
    SENTENCE_KNN_THRESHOLD_DEFAULT,
};
use graphrag_graph::types as gtypes;
use graphrag_graph::{GraphError, GraphStore, IndexingState};
use graphrag_ingest::{self as ingest, IngestConfig, IngestError};
use graphrag_retrieval::ner::EntityExtractor;
use graphrag_retrieval::synthesis::Synthesizer;
use graphrag_retrieval::types::EvidenceItem;

#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("embedding gateway error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("graph store error: {0}")]
    Graph(#[from] GraphError),

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("document skeleton carried no document node")]
    MissingDocument,
}

/// Ties the ingest skeleton builder, the embedding gateway, entity
/// extraction, and the graph store together into one run of the 13-state
/// pipeline. Borrowed, not owned — the same shape as
/// `graphrag_retrieval::orchestrator::Orchestrator` for the query-time
/// counterpart.
pub struct IndexingPipeline<'a> {
    graph: &'a GraphStore,
    embeddings: &'a EmbeddingGateway,
    entity_extractor: &'a dyn EntityExtractor,
    synthesizer: &'a dyn Synthesizer,
    ingest_config: IngestConfig,
}

impl<'a> IndexingPipeline<'a> {
    pub fn new(
        graph: &'a GraphStore,
        embeddings: &'a EmbeddingGateway,
        entity_extractor: &'a dyn EntityExtractor,
        synthesizer: &'a dyn Synthesizer,
    ) -> Self {
        Self {
            graph,
            embeddings,
            entity_extractor,
            synthesizer,
            ingest_config: IngestConfig::default(),
        }
    }

    pub fn with_ingest_config(mut self, cfg: IngestConfig) -> Self {
        self.ingest_config = cfg;
        self
    }

    /// Runs every stage from wherever `group_id` currently sits through to
    /// `Ready`. Safe to call repeatedly for the same document: each stage
    /// checks the persisted state before doing its work. A group already at
    /// `Ready` short-circuits to a no-op — re-ingesting an unchanged
    /// document must not produce new nodes or edges (§8 round-trip
    /// property), and replaying the full stage sequence from `Ingested`
    /// against an already-`Ready` group is an illegal transition.
    pub async fn run(&self, raw: ingest::RawDocument) -> Result<(), IndexingError> {
        let group_id = raw.group_id.clone();
        if self.graph.indexing_state(&group_id)? == IndexingState::Ready {
            return Ok(());
        }
        let skeleton = ingest::build_skeleton(raw, &self.ingest_config)?;
        let document = skeleton.document.ok_or(IndexingError::MissingDocument)?;

        self.graph.put_node(gtypes::Node::Document(gtypes::Document {
            id: document.id.clone(),
            group_id: document.group_id.clone(),
            title: document.title.clone(),
            page_count: document.page_count,
        }))?;
        self.transition(&group_id, IndexingState::PartitionedByGroup)?;

        // ---- Chunks, embedded ----
        let section_path_by_id: HashMap<String, String> = skeleton
            .sections
            .iter()
            .map(|s| (s.id.clone(), s.path_key.clone()))
            .collect();

        let mut chunks = skeleton.chunks;
        let chunk_vectors = self
            .embed_units(&document.title, &chunks, &section_path_by_id, |c| &c.section_id, |c| &c.id, |c| &c.raw_text)
            .await?;
        for chunk in chunks.iter_mut() {
            chunk.embedding_v2 = chunk_vectors.get(&chunk.id).cloned();
        }
        for chunk in &chunks {
            let Some(embedding) = chunk.embedding_v2.clone() else { continue };
            self.graph.put_node(gtypes::Node::TextChunk(gtypes::TextChunk {
                id: chunk.id.clone(),
                group_id: chunk.group_id.clone(),
                document_id: chunk.document_id.clone(),
                section_id: chunk.section_id.clone(),
                text: chunk.raw_text.clone(),
                embedding_v2: embedding,
            }))?;
        }
        self.transition(&group_id, IndexingState::ChunksEmbedded)?;

        // ---- Entities, extracted ----
        let mut entities_by_name: HashMap<String, gtypes::Entity> = HashMap::new();
        let mut mentions: Vec<(String, String)> = Vec::new(); // (chunk_id, entity_id)
        for chunk in &chunks {
            for surface_form in self.entity_extractor.extract_surface_forms(&chunk.raw_text) {
                let entity_id = entity_id(&group_id, &surface_form);
                mentions.push((chunk.id.clone(), entity_id.clone()));
                entities_by_name.entry(surface_form.clone()).or_insert_with(|| gtypes::Entity {
                    id: entity_id,
                    group_id: group_id.clone(),
                    canonical_name: surface_form,
                    aliases: Vec::new(),
                    embedding_v2: vec![0.0; gtypes::EMBEDDING_DIM],
                });
            }
        }
        let mut entities: Vec<gtypes::Entity> = entities_by_name.into_values().collect();
        entities.sort_by(|a, b| a.id.cmp(&b.id));
        self.transition(&group_id, IndexingState::EntitiesExtracted)?;

        // ---- Entities, embedded ----
        if !entities.is_empty() {
            let units: Vec<(String, String)> = entities
                .iter()
                .map(|e| (e.id.clone(), e.canonical_name.clone()))
                .collect();
            let embedded = self.embeddings.embed_contextual(&document.title, "", &units).await?;
            let by_id: HashMap<String, Vec<f32>> = embedded.into_iter().map(|e| (e.id, e.vector)).collect();
            for entity in entities.iter_mut() {
                if let Some(vector) = by_id.get(&entity.id) {
                    entity.embedding_v2 = vector.clone();
                }
            }
        }
        for entity in &entities {
            self.graph.put_node(gtypes::Node::Entity(entity.clone()))?;
        }
        self.transition(&group_id, IndexingState::EntitiesEmbedded)?;

        // ---- Section hierarchy ----
        for section in &skeleton.sections {
            self.graph.put_node(gtypes::Node::Section(gtypes::Section {
                id: section.id.clone(),
                group_id: group_id.clone(),
                document_id: section.document_id.clone(),
                title: section.title.clone(),
                path_key: section.path_key.clone(),
                parent_section_id: section.parent_section_id.clone(),
            }))?;
        }
        for edge in &skeleton.edges {
            if let Some(kind) = convert_deterministic_kind(edge.kind) {
                self.graph.put_deterministic_edge(
                    &group_id,
                    gtypes::DeterministicEdge { kind, from: edge.from.clone(), to: edge.to.clone() },
                )?;
            }
        }
        for (chunk_id, entity_id) in &mentions {
            self.graph.put_deterministic_edge(
                &group_id,
                gtypes::DeterministicEdge {
                    kind: gtypes::DeterministicEdgeKind::Mentions,
                    from: chunk_id.clone(),
                    to: entity_id.clone(),
                },
            )?;
        }
        self.transition(&group_id, IndexingState::SectionHierarchyBuilt)?;

        // ---- Sentences, extracted ----
        let mut sentences = skeleton.sentences;
        for sentence in &sentences {
            self.graph.put_node(gtypes::Node::Sentence(gtypes::Sentence {
                id: sentence.id.clone(),
                group_id: sentence.group_id.clone(),
                chunk_id: sentence.chunk_id.clone(),
                paragraph_id: sentence.parent_paragraph_id.clone(),
                section_path: sentence.section_path.clone(),
                parent_paragraph_text: sentence.parent_paragraph_text.clone(),
                page: sentence.page,
                confidence: sentence.confidence,
                char_offset: sentence.char_offset,
                char_len: sentence.char_len,
                geometry: sentence.geometry.iter().map(convert_geometry).collect(),
                embedding_v2: vec![0.0; gtypes::EMBEDDING_DIM],
                source: convert_sentence_source(sentence.source),
                text: sentence.text.clone(),
                next_sentence_id: sentence.next_sentence_id.clone(),
                prev_sentence_id: sentence.prev_sentence_id.clone(),
            }))?;
        }
        self.transition(&group_id, IndexingState::SentencesExtracted)?;

        // ---- Sentences, embedded ----
        let mut by_section: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, sentence) in sentences.iter().enumerate() {
            by_section.entry(sentence.section_path.clone()).or_default().push(idx);
        }
        for (section_path, idxs) in &by_section {
            let units: Vec<(String, String)> = idxs
                .iter()
                .map(|&i| (sentences[i].id.clone(), sentences[i].text.clone()))
                .collect();
            let embedded = self.embeddings.embed_contextual(&document.title, section_path, &units).await?;
            let by_id: HashMap<String, Vec<f32>> = embedded.into_iter().map(|e| (e.id, e.vector)).collect();
            for &i in idxs {
                if let Some(vector) = by_id.get(&sentences[i].id) {
                    sentences[i].embedding_v2 = Some(vector.clone());
                }
            }
        }
        for sentence in &sentences {
            let Some(embedding) = sentence.embedding_v2.clone() else { continue };
            self.graph.put_node(gtypes::Node::Sentence(gtypes::Sentence {
                id: sentence.id.clone(),
                group_id: sentence.group_id.clone(),
                chunk_id: sentence.chunk_id.clone(),
                paragraph_id: sentence.parent_paragraph_id.clone(),
                section_path: sentence.section_path.clone(),
                parent_paragraph_text: sentence.parent_paragraph_text.clone(),
                page: sentence.page,
                confidence: sentence.confidence,
                char_offset: sentence.char_offset,
                char_len: sentence.char_len,
                geometry: sentence.geometry.iter().map(convert_geometry).collect(),
                embedding_v2: embedding,
                source: convert_sentence_source(sentence.source),
                text: sentence.text.clone(),
                next_sentence_id: sentence.next_sentence_id.clone(),
                prev_sentence_id: sentence.prev_sentence_id.clone(),
            }))?;
        }
        self.transition(&group_id, IndexingState::SentencesEmbedded)?;

        // ---- Sparse edges, k-NN ----
        let sentence_vectors: Vec<SentenceVector> = sentences
            .iter()
            .filter_map(|s| s.embedding_v2.as_ref().map(|e| SentenceVector { id: &s.id, chunk_id: &s.chunk_id, embedding: e }))
            .collect();
        let sentence_edges =
            build_sentence_knn_edges(&sentence_vectors, SENTENCE_KNN_THRESHOLD_DEFAULT, SENTENCE_KNN_MAX_K_DEFAULT);
        if !sentence_edges.is_empty() {
            self.graph.put_probabilistic_edges(&group_id, sentence_edges)?;
        }
        let entity_vectors: Vec<EntityVector> =
            entities.iter().map(|e| EntityVector { id: &e.id, embedding: &e.embedding_v2 }).collect();
        let entity_edges =
            build_entity_knn_edges(&entity_vectors, ENTITY_KNN_SIMILARITY_CUTOFF_DEFAULT, ENTITY_KNN_TOP_K_DEFAULT);
        if !entity_edges.is_empty() {
            self.graph.put_probabilistic_edges(&group_id, entity_edges)?;
        }
        self.transition(&group_id, IndexingState::SentenceKnnEdgesBuilt)?;

        // ---- Communities, detected ----
        let communities = self.graph.detect_communities(&group_id)?;
        self.transition(&group_id, IndexingState::CommunitiesDetected)?;

        // ---- Communities, summarised ----
        let entity_by_id: HashMap<&str, &gtypes::Entity> = entities.iter().map(|e| (e.id.as_str(), e)).collect();
        let mut summaries: Vec<(String, String, Vec<String>)> = Vec::with_capacity(communities.len());
        for (idx, member_ids) in communities.iter().enumerate() {
            let evidence: Vec<EvidenceItem> = member_ids
                .iter()
                .filter_map(|id| entity_by_id.get(id.as_str()))
                .map(|e| EvidenceItem { id: e.id.clone(), text: e.canonical_name.clone(), score: 1.0 })
                .collect();
            let output = self
                .synthesizer
                .synthesize(
                    "Summarize what connects this group of entities.",
                    &evidence,
                    "produce a one-paragraph community summary",
                )
                .await
                .map_err(|e| IndexingError::Synthesis(e.to_string()))?;
            let community_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{group_id}\0community\0{idx}").as_bytes())
                .to_string();
            summaries.push((community_id, output.answer_text, member_ids.clone()));
        }
        self.transition(&group_id, IndexingState::CommunitiesSummarised)?;

        // ---- Communities, embedded ----
        if !summaries.is_empty() {
            let units: Vec<(String, String)> =
                summaries.iter().map(|(id, summary, _)| (id.clone(), summary.clone())).collect();
            let embedded = self.embeddings.embed_contextual(&document.title, "", &units).await?;
            let by_id: HashMap<String, Vec<f32>> = embedded.into_iter().map(|e| (e.id, e.vector)).collect();
            for (community_id, summary, member_ids) in &summaries {
                let embedding = by_id.get(community_id).cloned().unwrap_or_else(|| vec![0.0; gtypes::EMBEDDING_DIM]);
                self.graph.put_node(gtypes::Node::Community(gtypes::Community {
                    id: community_id.clone(),
                    group_id: group_id.clone(),
                    summary: summary.clone(),
                    summary_embedding_v2: embedding,
                    member_entity_ids: member_ids.clone(),
                }))?;
            }
        }
        self.transition(&group_id, IndexingState::CommunityEmbedded)?;

        self.transition(&group_id, IndexingState::Ready)?;
        Ok(())
    }

    fn transition(&self, group_id: &str, target: IndexingState) -> Result<(), IndexingError> {
        self.graph.transition_indexing_state(group_id, target)?;
        Ok(())
    }

    /// Batches `items` into one `embed_contextual` call per distinct section
    /// path, returning each item's id mapped to its vector. The per-item
    /// accessor closures let chunks and sentences share this helper despite
    /// not sharing a type.
    async fn embed_units<T>(
        &self,
        doc_title: &str,
        items: &[T],
        section_path_by_id: &HashMap<String, String>,
        section_id_of: impl Fn(&T) -> &Option<String>,
        id_of: impl Fn(&T) -> &String,
        text_of: impl Fn(&T) -> &String,
    ) -> Result<HashMap<String, Vec<f32>>, IndexingError> {
        let mut by_section: HashMap<String, Vec<&T>> = HashMap::new();
        for item in items {
            let path = section_id_of(item)
                .as_ref()
                .and_then(|sid| section_path_by_id.get(sid))
                .cloned()
                .unwrap_or_default();
            by_section.entry(path).or_default().push(item);
        }
        let mut out = HashMap::new();
        for (section_path, group) in by_section {
            let units: Vec<(String, String)> =
                group.iter().map(|item| (id_of(item).clone(), text_of(item).clone())).collect();
            let embedded = self.embeddings.embed_contextual(doc_title, &section_path, &units).await?;
            out.extend(embedded.into_iter().map(|e| (e.id, e.vector)));
        }
        Ok(out)
    }
}

fn entity_id(group_id: &str, surface_form: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{group_id}\0entity\0{}", surface_form.to_lowercase()).as_bytes())
        .to_string()
}

fn convert_deterministic_kind(kind: ingest::DeterministicEdgeKind) -> Option<gtypes::DeterministicEdgeKind> {
    Some(match kind {
        ingest::DeterministicEdgeKind::HasSection => gtypes::DeterministicEdgeKind::HasSection,
        ingest::DeterministicEdgeKind::InSection => gtypes::DeterministicEdgeKind::InSection,
        ingest::DeterministicEdgeKind::InDocument => gtypes::DeterministicEdgeKind::InDocument,
        ingest::DeterministicEdgeKind::PartOf => gtypes::DeterministicEdgeKind::PartOf,
        ingest::DeterministicEdgeKind::Next => gtypes::DeterministicEdgeKind::Next,
        ingest::DeterministicEdgeKind::SubsectionOf => gtypes::DeterministicEdgeKind::SubsectionOf,
    })
}

fn convert_sentence_source(source: ingest::SentenceSource) -> gtypes::SentenceSource {
    match source {
        ingest::SentenceSource::Paragraph => gtypes::SentenceSource::Paragraph,
        ingest::SentenceSource::TableRow => gtypes::SentenceSource::TableRow,
        ingest::SentenceSource::FigureCaption => gtypes::SentenceSource::FigureCaption,
        ingest::SentenceSource::FigureDescription => gtypes::SentenceSource::FigureDescription,
        ingest::SentenceSource::Equation => gtypes::SentenceSource::Equation,
    }
}

fn convert_geometry(geometry: &ingest::Geometry) -> gtypes::Polygon {
    gtypes::Polygon { points: geometry.polygon.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphrag_embedding::EmbeddingConfig;
    use graphrag_graph::GraphStoreConfig;
    use graphrag_ingest::{ParsedUnit, RawDocument};
    use graphrag_retrieval::ner::HeuristicEntityExtractor;
    use graphrag_retrieval::synthesis::StubSynthesizer;

    fn raw_document() -> RawDocument {
        RawDocument {
            doc_id: String::new(),
            group_id: "tenant-a".into(),
            title: "Sample Contract".into(),
            received_at: None,
            units: vec![ParsedUnit {
                paragraph_id: "p1".into(),
                text: "Acme Corp agreed to pay the Agent net thirty.".into(),
                section_path: vec!["Terms".into(), "Payment".into()],
                source: ingest::SentenceSource::Paragraph,
                page: 1,
                confidence: 0.97,
                geometry: None,
            }],
        }
    }

    #[tokio::test]
    async fn full_run_reaches_ready_state() {
        let graph = GraphStore::new(GraphStoreConfig::default()).unwrap();
        let embeddings = EmbeddingGateway::new(EmbeddingConfig { mode: "stub".into(), ..Default::default() });
        let extractor = HeuristicEntityExtractor;
        let synthesizer = StubSynthesizer;
        let pipeline = IndexingPipeline::new(&graph, &embeddings, &extractor, &synthesizer);

        pipeline.run(raw_document()).await.unwrap();

        assert_eq!(graph.indexing_state("tenant-a").unwrap(), IndexingState::Ready);
    }

    #[tokio::test]
    async fn entities_are_extracted_and_embedded() {
        let graph = GraphStore::new(GraphStoreConfig::default()).unwrap();
        let embeddings = EmbeddingGateway::new(EmbeddingConfig { mode: "stub".into(), ..Default::default() });
        let extractor = HeuristicEntityExtractor;
        let synthesizer = StubSynthesizer;
        let pipeline = IndexingPipeline::new(&graph, &embeddings, &extractor, &synthesizer);

        pipeline.run(raw_document()).await.unwrap();

        let nodes = graph.scan_nodes("tenant-a").unwrap();
        let entity_count = nodes.iter().filter(|n| matches!(n, gtypes::Node::Entity(_))).count();
        assert!(entity_count >= 1);
    }

    #[tokio::test]
    async fn rerunning_the_same_document_is_idempotent_at_ready() {
        let graph = GraphStore::new(GraphStoreConfig::default()).unwrap();
        let embeddings = EmbeddingGateway::new(EmbeddingConfig { mode: "stub".into(), ..Default::default() });
        let extractor = HeuristicEntityExtractor;
        let synthesizer = StubSynthesizer;
        let pipeline = IndexingPipeline::new(&graph, &embeddings, &extractor, &synthesizer);

        pipeline.run(raw_document()).await.unwrap();
        let nodes_before = graph.scan_nodes("tenant-a").unwrap().len();

        // Re-running against an already-`Ready` group is a no-op: it must
        // not error and must not add any new nodes.
        pipeline.run(raw_document()).await.unwrap();
        let nodes_after = graph.scan_nodes("tenant-a").unwrap().len();
        assert_eq!(nodes_before, nodes_after);
    }
}
