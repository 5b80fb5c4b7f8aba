//! # GraphRAG
//!
//! Workspace umbrella crate for the graph-augmented retrieval engine:
//! ingest, embed, index, and answer over a tenant-partitioned knowledge
//! graph. Applications that want the whole pipeline behind one dependency
//! use this crate; applications that only need one stage (e.g. just the
//! HTTP gateway) can depend on the relevant `graphrag-*` crate directly.
//!
//! ## Layout
//!
//! - [`graphrag_ingest`] (re-exported as [`ingest`]) — parses a
//!   `RawDocument` into a deterministic `DocumentSkeleton` (documents,
//!   sections, chunks, sentences, deterministic edges).
//! - [`graphrag_embedding`] (re-exported as [`embedding`]) — the
//!   contextualised embedding gateway (structural-label prefixing,
//!   batching, retry/circuit-breaker).
//! - [`graphrag_graph`] (re-exported as [`graph`]) — the
//!   tenant-partitioned store: nodes, edges, ANN index, PPR, k-NN edge
//!   construction, community detection, the 13-state indexing state
//!   machine.
//! - [`graphrag_retrieval`] (re-exported as [`retrieval`]) — seed
//!   resolution, the four retrieval routes, and the query orchestrator.
//! - [`server`] — the Axum HTTP gateway (`graphrag-server`; its library
//!   target is named `server`).
//! - [`config`] — this crate's own YAML configuration format, layered over
//!   the sub-crates' configs (§9, §15.3).
//! - [`indexing`] — the pipeline that drives one document through every
//!   indexing-state transition, tying ingest, embedding, entity
//!   extraction, k-NN edge construction, community detection, and
//!   summarization together.
//!
//! ## Quick start
//!
//! ```ignore
//! use graphrag::config::GraphragConfig;
//! use graphrag::indexing::IndexingPipeline;
//! use graphrag::{embedding, graph, ingest, retrieval};
//!
//! # async fn demo(raw: ingest::RawDocument) -> anyhow::Result<()> {
//! let config = GraphragConfig::default();
//! let store = graph::GraphStore::new(config.graph_store_config())?;
//! let gateway = embedding::EmbeddingGateway::new(config.embedding.clone());
//! let extractor = retrieval::ner::HeuristicEntityExtractor;
//! let synthesizer = retrieval::synthesis::StubSynthesizer;
//!
//! let pipeline = IndexingPipeline::new(&store, &gateway, &extractor, &synthesizer);
//! pipeline.run(raw).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod indexing;

pub use graphrag_embedding as embedding;
pub use graphrag_graph as graph;
pub use graphrag_ingest as ingest;
pub use graphrag_retrieval as retrieval;
pub use server;

pub use config::{ConfigLoadError, GraphYamlConfig, GraphragConfig};
pub use indexing::{IndexingError, IndexingPipeline};
