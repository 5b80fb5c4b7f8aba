//! Spec §7/§8 error-taxonomy and boundary-behaviour tests: empty-corpus
//! degradation, an unconfigured vector index surfacing `IndexMissing`
//! rather than an empty result, and seed-weight validation.

use std::collections::HashMap;

use graphrag::graph::ppr::{ppr, Adjacency};
use graphrag::graph::{GraphError, GraphStore, GraphStoreConfig};
use graphrag::embedding::{EmbeddingConfig, EmbeddingGateway};
use graphrag::retrieval::ner::HeuristicEntityExtractor;
use graphrag::retrieval::orchestrator::Orchestrator;
use graphrag::retrieval::synthesis::StubSynthesizer;
use graphrag::retrieval::types::QueryOptions;

#[tokio::test]
async fn empty_corpus_returns_empty_answer_without_crashing() {
    let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
    let gateway = EmbeddingGateway::new(EmbeddingConfig { mode: "stub".into(), ..Default::default() });
    let extractor = HeuristicEntityExtractor;
    let synthesizer = StubSynthesizer;
    let orchestrator = Orchestrator::new(&store, &gateway, &extractor, &synthesizer);

    // No NER matches, no sentence hits, no community hits: every tier is
    // empty, so the orchestrator degrades rather than propagating
    // `EmptySeedSet` (§4.3's edge case, §8's "empty corpus" boundary).
    let answer = orchestrator.answer("Hello.", "empty-tenant", QueryOptions::default()).await.unwrap();
    assert!(answer.citations.is_empty());
}

#[test]
fn search_against_an_unregistered_index_name_is_fatal_not_empty() {
    let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
    let query_vector = vec![0.0f32; graphrag::graph::types::EMBEDDING_DIM];
    let err = store
        .search_vectors("not_a_real_index", "tenant-a", &query_vector, 10)
        .unwrap_err();
    assert!(matches!(err, GraphError::IndexMissing(_)));
}

#[test]
fn ppr_rejects_seed_weights_that_do_not_sum_to_one() {
    let adjacency = Adjacency::new();
    let mut seeds = HashMap::new();
    seeds.insert("entity-a".to_string(), 0.4f32);
    let err = ppr(&seeds, 0.85, 10, &adjacency).unwrap_err();
    assert!(matches!(err, GraphError::InvalidSeedWeights(_)));
}
