//! Route 3 — global MAP-REDUCE search (§4.5). Corpus-wide thematic
//! questions. Kept as a frozen legacy snapshot (§9's version-registry design
//! note) now that Route 5 is the default for the intents this route used to
//! own; reachable via [`crate::types::QueryOptions::force_route`].

use async_trait::async_trait;

use graphrag_graph::types::Node;
use graphrag_graph::vectors::COMMUNITY_SUMMARY_EMBEDDING_V2;

use crate::error::RetrievalError;
use crate::route::{RouteContext, RouteCost, RouteOutcome, RouteStrategy};
use crate::routes::anchor_and_expand;
use crate::types::{EvidenceItem, QueryIntent, RouteKind};

const TOP_COMMUNITIES: usize = 10;
const SENTENCE_EVIDENCE_TOP_K: usize = 20;
const SENTENCE_EVIDENCE_RESERVE: usize = 10;

pub struct GlobalRoute;

#[async_trait]
impl RouteStrategy for GlobalRoute {
    fn kind(&self) -> RouteKind {
        RouteKind::Global
    }

    fn classify_applicable(&self, intent: QueryIntent) -> bool {
        matches!(intent, QueryIntent::ThematicSurvey | QueryIntent::CrossDocComparison)
    }

    fn needs_seed_resolution(&self) -> bool {
        false
    }

    fn cost_estimate(&self) -> RouteCost {
        RouteCost {
            estimated_llm_calls: 1 + TOP_COMMUNITIES as u32,
            estimated_graph_calls: 2,
        }
    }

    async fn execute(&self, ctx: &RouteContext<'_>) -> Result<RouteOutcome, RetrievalError> {
        ctx.check_cancelled()?;

        let query_vector = ctx.embeddings.embed_query(ctx.query).await?;
        let community_hits = ctx.graph.search_vectors(
            COMMUNITY_SUMMARY_EMBEDDING_V2,
            ctx.group_id,
            &query_vector.vector,
            TOP_COMMUNITIES,
        )?;

        let nodes = ctx.graph.scan_nodes(ctx.group_id)?;
        let mut summaries = Vec::new();
        for hit in &community_hits {
            if let Some(Node::Community(c)) = nodes.iter().find(|n| n.id() == hit.node_id) {
                summaries.push((c.id.clone(), c.summary.clone(), hit.score));
            }
        }

        // MAP: one claim-generation call per matched community, run
        // concurrently with the Route 2 sentence-evidence "insurance policy"
        // (§4.5 stage 3).
        let map_stage = async {
            let mut claims = Vec::new();
            for (community_id, summary, score) in &summaries {
                ctx.check_cancelled()?;
                for claim in ctx.synthesizer.map_claims(ctx.query, summary).await? {
                    claims.push(EvidenceItem {
                        id: community_id.clone(),
                        text: claim.text,
                        score: claim.relevance * score,
                    });
                }
            }
            Ok::<_, RetrievalError>(claims)
        };
        let sentence_stage = anchor_and_expand(
            ctx.graph,
            ctx.embeddings,
            ctx.group_id,
            ctx.query,
            SENTENCE_EVIDENCE_TOP_K,
        );

        let (claims, sentence_evidence) = tokio::join!(map_stage, sentence_stage);
        let mut claims = claims?;
        let mut sentence_evidence = sentence_evidence?;
        sentence_evidence.evidence.truncate(SENTENCE_EVIDENCE_RESERVE);

        let thoughts = vec![format!(
            "matched {} communities, generated {} claims, reserved {} sentence-evidence paragraphs",
            summaries.len(),
            claims.len(),
            sentence_evidence.evidence.len()
        )];

        let confidence = if claims.is_empty() {
            crate::routes::heuristic_confidence(&sentence_evidence.evidence)
        } else {
            claims.iter().map(|c| c.score).sum::<f32>() / claims.len() as f32
        };

        claims.extend(sentence_evidence.evidence);
        Ok(RouteOutcome {
            evidence: claims,
            citations: sentence_evidence.citations,
            confidence,
            thoughts,
        })
    }
}
