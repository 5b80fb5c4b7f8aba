//! Configuration for skeleton construction.
//!
//! `IngestConfig` controls chunk sizing, document-id derivation, and the
//! document-size guard rails applied before a [`crate::RawDocument`] is
//! turned into a [`crate::DocumentSkeleton`].
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Runtime configuration for skeleton construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Semantic version of this configuration; bump on breaking changes.
    pub version: u32,

    /// Namespace UUID for deterministic document id derivation
    /// (`UUIDv5(doc_id_namespace, group_id + "\0" + title)`) when the
    /// caller does not supply `doc_id`.
    pub doc_id_namespace: Uuid,

    /// Target token count per [`crate::TextChunk`]. Chunk boundaries fall on
    /// paragraph boundaries; a chunk may run short of this target rather
    /// than split a paragraph.
    pub chunk_target_tokens: usize,

    /// Hard cap on tokens per chunk; a single paragraph longer than this is
    /// still kept whole (the spec treats chunking as paragraph-aligned, not
    /// byte-aligned), but a warning is logged.
    pub chunk_max_tokens: usize,

    /// Whether to strip control characters from titles and section paths.
    pub strip_control_chars: bool,

    /// Maximum number of parsed units accepted per document. Guards against
    /// a pathological upstream parser flooding the skeleton builder.
    #[serde(default)]
    pub max_units_per_document: Option<usize>,
}

/// Errors produced by [`IngestConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("chunk_target_tokens ({target}) exceeds chunk_max_tokens ({max})")]
    TargetExceedsMax { target: usize, max: usize },
    #[error("chunk_target_tokens must be greater than zero")]
    ZeroTarget,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            doc_id_namespace: Uuid::NAMESPACE_OID,
            chunk_target_tokens: 600,
            chunk_max_tokens: 900,
            strip_control_chars: true,
            max_units_per_document: None,
        }
    }
}

impl IngestConfig {
    /// Checks internal consistency; call once at process start-up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_target_tokens == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if self.chunk_target_tokens > self.chunk_max_tokens {
            return Err(ConfigError::TargetExceedsMax {
                target: self.chunk_target_tokens,
                max: self.chunk_max_tokens,
            });
        }
        Ok(())
    }

    pub fn with_chunk_target_tokens(mut self, tokens: usize) -> Self {
        self.chunk_target_tokens = tokens;
        self
    }

    pub fn with_chunk_max_tokens(mut self, tokens: usize) -> Self {
        self.chunk_max_tokens = tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(IngestConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_target_rejected() {
        let cfg = IngestConfig {
            chunk_target_tokens: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTarget));
    }

    #[test]
    fn target_exceeding_max_rejected() {
        let cfg = IngestConfig {
            chunk_target_tokens: 1000,
            chunk_max_tokens: 900,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TargetExceedsMax { .. })
        ));
    }
}
