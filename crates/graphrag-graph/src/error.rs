use thiserror::Error;

/// Error taxonomy for the graph store. `IndexMissing` and `DimensionMismatch`
/// are fatal at query time by design — a silent empty result from a missing
/// vector index has historically degraded retrieval to "answer not in
/// corpus" with no alarm, so this crate refuses to return one.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("vector index '{0}' is not configured")]
    IndexMissing(String),

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("node '{0}' not found")]
    NodeNotFound(String),

    #[error("seed weights must sum to 1.0 (got {0})")]
    InvalidSeedWeights(f32),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("sparsity budget exceeded for group '{group_id}': {count} edges over {limit}")]
    SparsityBudgetExceeded {
        group_id: String,
        count: usize,
        limit: usize,
    },
}

impl GraphError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Serde(e.to_string())
    }
}
