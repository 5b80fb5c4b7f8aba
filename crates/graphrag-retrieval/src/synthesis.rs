//! The synthesis capability (§4.1, §4.8): turns retrieved evidence into a
//! final answer. Modeled as a trait so every route consumes it identically
//! and tests can substitute a deterministic stub for a live LLM call.

use async_trait::async_trait;

use crate::error::RetrievalError;
use crate::types::{Citation, EvidenceItem};

/// One MAP-stage claim produced from a single community summary (§4.5).
#[derive(Debug, Clone)]
pub struct Claim {
    pub text: String,
    pub supporting_entity_ids: Vec<String>,
    pub relevance: f32,
}

/// Final synthesizer output, before the orchestrator attaches route metadata.
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub answer_text: String,
    pub citations: Vec<Citation>,
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Produces the final answer from deduplicated evidence, citing each
    /// claim by the evidence item's id. `instructions` carries route-specific
    /// guidance (e.g. "cite by sentence id").
    async fn synthesize(
        &self,
        query: &str,
        evidence: &[EvidenceItem],
        instructions: &str,
    ) -> Result<SynthesisOutput, RetrievalError>;

    /// Route 3's MAP stage: up to 3 claims from one community summary.
    async fn map_claims(&self, query: &str, community_summary: &str) -> Result<Vec<Claim>, RetrievalError>;

    /// Route 4's decomposition stage: 3-5 sub-questions, capped at 5.
    async fn decompose(&self, query: &str) -> Result<Vec<String>, RetrievalError>;
}

/// Deterministic stand-in used in tests and wherever a live LLM is not
/// configured. Production deployments provide an HTTP-backed implementation
/// analogous to `graphrag_embedding`'s `"api"` mode.
pub struct StubSynthesizer;

#[async_trait]
impl Synthesizer for StubSynthesizer {
    async fn synthesize(
        &self,
        _query: &str,
        evidence: &[EvidenceItem],
        _instructions: &str,
    ) -> Result<SynthesisOutput, RetrievalError> {
        let mut ranked = evidence.to_vec();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        let top: Vec<&EvidenceItem> = ranked.iter().take(5).collect();

        let answer_text = if top.is_empty() {
            "No supporting evidence was retrieved for this query.".to_string()
        } else {
            format!(
                "Based on the retrieved evidence: {}",
                top.iter().map(|e| e.text.as_str()).collect::<Vec<_>>().join(" ")
            )
        };

        let citations = top
            .iter()
            .map(|e| Citation {
                node_id: e.id.clone(),
                excerpt: e.text.chars().take(160).collect(),
            })
            .collect();

        Ok(SynthesisOutput { answer_text, citations })
    }

    async fn map_claims(&self, query: &str, community_summary: &str) -> Result<Vec<Claim>, RetrievalError> {
        if community_summary.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Claim {
            text: format!("Regarding \"{query}\": {community_summary}"),
            supporting_entity_ids: Vec::new(),
            relevance: 0.5,
        }])
    }

    async fn decompose(&self, query: &str) -> Result<Vec<String>, RetrievalError> {
        let parts: Vec<String> = query
            .split(&[',', ';'][..])
            .flat_map(|segment| segment.split(" and "))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(5)
            .collect();

        if parts.len() <= 1 {
            Ok(vec![query.to_string()])
        } else {
            Ok(parts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_synthesize_empty_evidence_reports_no_support() {
        let synthesizer = StubSynthesizer;
        let out = synthesizer.synthesize("q", &[], "cite by sentence id").await.unwrap();
        assert!(out.answer_text.contains("No supporting evidence"));
        assert!(out.citations.is_empty());
    }

    #[tokio::test]
    async fn stub_synthesize_cites_top_evidence() {
        let synthesizer = StubSynthesizer;
        let evidence = vec![
            EvidenceItem { id: "s1".into(), text: "low score".into(), score: 0.1 },
            EvidenceItem { id: "s2".into(), text: "high score".into(), score: 0.9 },
        ];
        let out = synthesizer.synthesize("q", &evidence, "").await.unwrap();
        assert_eq!(out.citations[0].node_id, "s2");
    }

    #[tokio::test]
    async fn stub_decompose_splits_on_and() {
        let synthesizer = StubSynthesizer;
        let parts = synthesizer.decompose("find the agent and find the total due").await.unwrap();
        assert_eq!(parts.len(), 2);
    }

    #[tokio::test]
    async fn stub_decompose_single_clause_returns_original() {
        let synthesizer = StubSynthesizer;
        let parts = synthesizer.decompose("who is the agent").await.unwrap();
        assert_eq!(parts, vec!["who is the agent".to_string()]);
    }
}
