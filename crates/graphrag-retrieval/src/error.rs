use thiserror::Error;

use graphrag_embedding::EmbeddingError;
use graphrag_graph::GraphError;

/// Errors surfaced by seed resolution, the routes, and the orchestrator.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("graph store error: {0}")]
    Graph(#[from] GraphError),

    #[error("embedding gateway error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// All three Seed Resolver tiers came back empty (§4.3). The orchestrator
    /// downgrades to pure sentence-vector retrieval rather than propagating
    /// this to the caller.
    #[error("seed resolver produced an empty seed set for query {0:?}")]
    EmptySeedSet(String),

    #[error("query cancelled")]
    Cancelled,

    #[error("synthesis failed: {0}")]
    Synthesis(String),
}
