//! The indexing pipeline's per-group state machine.
//!
//! Persisted as one record per group rather than an in-memory global (§9 —
//! "a persisted state record, not in-memory globals"), so a failure mid
//! transition is recoverable by restarting from the last successful state.

use serde::{Deserialize, Serialize};

use crate::backend::GraphBackend;
use crate::error::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexingState {
    Ingested,
    PartitionedByGroup,
    ChunksEmbedded,
    EntitiesExtracted,
    EntitiesEmbedded,
    SectionHierarchyBuilt,
    SentencesExtracted,
    SentencesEmbedded,
    SentenceKnnEdgesBuilt,
    CommunitiesDetected,
    CommunitiesSummarised,
    CommunityEmbedded,
    Ready,
}

impl IndexingState {
    const ORDER: [IndexingState; 13] = [
        IndexingState::Ingested,
        IndexingState::PartitionedByGroup,
        IndexingState::ChunksEmbedded,
        IndexingState::EntitiesExtracted,
        IndexingState::EntitiesEmbedded,
        IndexingState::SectionHierarchyBuilt,
        IndexingState::SentencesExtracted,
        IndexingState::SentencesEmbedded,
        IndexingState::SentenceKnnEdgesBuilt,
        IndexingState::CommunitiesDetected,
        IndexingState::CommunitiesSummarised,
        IndexingState::CommunityEmbedded,
        IndexingState::Ready,
    ];

    fn index(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).expect("exhaustive")
    }

    /// The next state is reachable from `self` only by taking the single
    /// declared transition; transitions are never skipped or reordered.
    pub fn next(&self) -> Option<IndexingState> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    pub fn can_transition_to(&self, target: IndexingState) -> bool {
        self.next() == Some(target)
    }
}

fn state_key(group_id: &str) -> String {
    format!("{group_id}:__indexing_state")
}

/// Reads a group's persisted indexing state, defaulting to `Ingested` for a
/// group that has never been written (a brand-new group starts at the
/// beginning of the pipeline, not at an undefined state).
pub fn read_state(backend: &dyn GraphBackend, group_id: &str) -> Result<IndexingState, GraphError> {
    match backend.get(&state_key(group_id))? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        None => Ok(IndexingState::Ingested),
    }
}

/// Idempotent transition: writing the same target state twice in a row is a
/// no-op success, matching "each transition is idempotent" from §4.2. Any
/// other attempted jump is rejected so a crashed pipeline cannot silently
/// skip a stage on restart.
pub fn transition(
    backend: &dyn GraphBackend,
    group_id: &str,
    target: IndexingState,
) -> Result<(), GraphError> {
    let current = read_state(backend, group_id)?;
    if current == target {
        return Ok(());
    }
    if !current.can_transition_to(target) {
        return Err(GraphError::backend(format!(
            "illegal indexing transition for group {group_id}: {current:?} -> {target:?}"
        )));
    }
    let bytes = serde_json::to_vec(&target)?;
    backend.put(&state_key(group_id), &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;

    #[test]
    fn new_group_starts_at_ingested() {
        let backend = InMemoryBackend::new();
        assert_eq!(read_state(&backend, "g1").unwrap(), IndexingState::Ingested);
    }

    #[test]
    fn sequential_transitions_succeed() {
        let backend = InMemoryBackend::new();
        transition(&backend, "g1", IndexingState::PartitionedByGroup).unwrap();
        assert_eq!(
            read_state(&backend, "g1").unwrap(),
            IndexingState::PartitionedByGroup
        );
        transition(&backend, "g1", IndexingState::ChunksEmbedded).unwrap();
        assert_eq!(
            read_state(&backend, "g1").unwrap(),
            IndexingState::ChunksEmbedded
        );
    }

    #[test]
    fn repeated_transition_is_idempotent() {
        let backend = InMemoryBackend::new();
        transition(&backend, "g1", IndexingState::PartitionedByGroup).unwrap();
        transition(&backend, "g1", IndexingState::PartitionedByGroup).unwrap();
        assert_eq!(
            read_state(&backend, "g1").unwrap(),
            IndexingState::PartitionedByGroup
        );
    }

    #[test]
    fn skipping_a_stage_is_rejected() {
        let backend = InMemoryBackend::new();
        let err = transition(&backend, "g1", IndexingState::Ready).unwrap_err();
        assert!(matches!(err, GraphError::Backend(_)));
    }

    #[test]
    fn groups_track_state_independently() {
        let backend = InMemoryBackend::new();
        transition(&backend, "g1", IndexingState::PartitionedByGroup).unwrap();
        assert_eq!(read_state(&backend, "g2").unwrap(), IndexingState::Ingested);
    }
}
