//! # Retrieval
//!
//! Seed resolution, the four retrieval routes, and the query orchestrator
//! sitting atop [`graphrag_graph`]'s store and [`graphrag_embedding`]'s
//! gateway. This crate owns query-time reasoning only; materializing
//! entities, edges, and communities into the graph is the indexing
//! pipeline's job, not this one's.
//!
//! ## Layout
//!
//! - [`classify`] — the deterministic query-intent classifier.
//! - [`seed_resolver`] — the three-tier weighted teleportation vector for
//!   PPR (entity, structural, thematic).
//! - [`route`] — the `Route` sum type and the `RouteStrategy` capability
//!   every route implements.
//! - [`routes`] — the four strategies themselves: local (skeleton-first),
//!   global (MAP-REDUCE), drift (multi-hop), unified (the target state).
//! - [`orchestrator`] — classify → resolve seeds → execute → retry →
//!   synthesize.
//! - [`synthesis`] — the LLM-backed capability every route consumes
//!   identically, plus a deterministic stub for tests.
//! - [`entity_resolution`] / [`ner`] — surface-form-to-entity resolution
//!   and the NER capability it depends on.
//!
//! ## Example
//!
//! ```
//! use graphrag_embedding::{EmbeddingConfig, EmbeddingGateway};
//! use graphrag_graph::{GraphStore, GraphStoreConfig};
//! use graphrag_retrieval::ner::HeuristicEntityExtractor;
//! use graphrag_retrieval::orchestrator::Orchestrator;
//! use graphrag_retrieval::synthesis::StubSynthesizer;
//! use graphrag_retrieval::types::QueryOptions;
//!
//! # tokio_test::block_on(async {
//! let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
//! let gateway = EmbeddingGateway::new(EmbeddingConfig { mode: "stub".into(), ..Default::default() });
//! let extractor = HeuristicEntityExtractor;
//! let synthesizer = StubSynthesizer;
//! let orchestrator = Orchestrator::new(&store, &gateway, &extractor, &synthesizer);
//!
//! let answer = orchestrator
//!     .answer("What was the total due?", "tenant-a", QueryOptions::default())
//!     .await
//!     .unwrap();
//! assert!(!answer.text.is_empty());
//! # });
//! ```

pub mod classify;
pub mod entity_resolution;
pub mod error;
pub mod ner;
pub mod orchestrator;
pub mod route;
pub mod routes;
pub mod seed_resolver;
pub mod synthesis;
pub mod types;

pub use error::RetrievalError;
pub use orchestrator::{Answer, Orchestrator};
pub use route::{Route, RouteContext, RouteOutcome, RouteStrategy};
pub use seed_resolver::{SeedResolver, SeedSet};
pub use types::{Citation, EvidenceItem, QueryIntent, QueryOptions, RouteKind, WeightProfile};
