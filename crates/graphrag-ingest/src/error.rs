//! Error types produced by the `graphrag-ingest` crate.
use thiserror::Error;

/// Errors that can occur while building a document skeleton.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    #[error("document has no parsed units")]
    EmptyDocument,
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("unit text empty after normalization: paragraph {0}")]
    EmptyNormalizedText(String),
    #[error("document exceeds unit size limit: {0}")]
    DocumentTooLarge(String),
    #[error("group_id must not be empty")]
    MissingGroupId,
}
