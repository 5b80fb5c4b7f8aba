//! Route 2 — skeleton-first local search (§4.4). Specific-fact queries
//! whose answer lives in one or a few sentences; no LLM call before
//! synthesis, and no cross-encoder rerank (empirically the correct sentence
//! already ranks first — see the module doc in §4.4).

use async_trait::async_trait;

use crate::error::RetrievalError;
use crate::route::{RouteContext, RouteCost, RouteOutcome, RouteStrategy};
use crate::routes::{anchor_and_expand, heuristic_confidence};
use crate::types::{QueryIntent, RouteKind};

const ANCHOR_TOP_K: usize = 20;

pub struct LocalRoute;

#[async_trait]
impl RouteStrategy for LocalRoute {
    fn kind(&self) -> RouteKind {
        RouteKind::Local
    }

    fn classify_applicable(&self, intent: QueryIntent) -> bool {
        matches!(intent, QueryIntent::FactExtraction)
    }

    fn needs_seed_resolution(&self) -> bool {
        false
    }

    fn cost_estimate(&self) -> RouteCost {
        RouteCost { estimated_llm_calls: 1, estimated_graph_calls: 2 }
    }

    async fn execute(&self, ctx: &RouteContext<'_>) -> Result<RouteOutcome, RetrievalError> {
        ctx.check_cancelled()?;
        let expansion = anchor_and_expand(ctx.graph, ctx.embeddings, ctx.group_id, ctx.query, ANCHOR_TOP_K).await?;
        ctx.check_cancelled()?;

        Ok(RouteOutcome {
            confidence: heuristic_confidence(&expansion.evidence),
            thoughts: vec![format!(
                "anchored on sentence vectors, expanded into {} paragraphs",
                expansion.evidence.len()
            )],
            evidence: expansion.evidence,
            citations: expansion.citations,
        })
    }
}
