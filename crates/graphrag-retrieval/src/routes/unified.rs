//! Route 5 — the unified weighted-PPR target state (§4.7, §9). Single seed
//! resolution, single PPR pass, parallel sentence evidence, one optional
//! rerank call, one synthesis call. Collapses routes 2-4 into one path once
//! the version registry promotes it for an intent.

use async_trait::async_trait;

use graphrag_embedding::RerankCandidate;
use graphrag_graph::types::{DeterministicEdgeKind, Node, TextChunk};

use crate::error::RetrievalError;
use crate::route::{RouteContext, RouteCost, RouteOutcome, RouteStrategy};
use crate::routes::anchor_and_expand;
use crate::types::{Citation, EvidenceItem, QueryIntent, RouteKind};

const PPR_TOP_K: usize = 50;
const SENTENCE_TOP_K: usize = 20;
const RERANK_TOP_K: usize = 20;

#[derive(Default)]
pub struct UnifiedRoute;

#[async_trait]
impl RouteStrategy for UnifiedRoute {
    fn kind(&self) -> RouteKind {
        RouteKind::Unified
    }

    fn classify_applicable(&self, _intent: QueryIntent) -> bool {
        // Target state: applicable to every intent (§9's "subsumes 3/4").
        true
    }

    fn needs_seed_resolution(&self) -> bool {
        true
    }

    fn cost_estimate(&self) -> RouteCost {
        RouteCost { estimated_llm_calls: 2, estimated_graph_calls: 3 }
    }

    async fn execute(&self, ctx: &RouteContext<'_>) -> Result<RouteOutcome, RetrievalError> {
        ctx.check_cancelled()?;
        let seeds = ctx.seeds.ok_or_else(|| RetrievalError::EmptySeedSet(ctx.query.to_string()))?;

        let ppr_ranked = ctx.graph.ppr(&seeds.weights, seeds.damping, PPR_TOP_K, ctx.group_id)?;

        let sentence_evidence_fut = anchor_and_expand(ctx.graph, ctx.embeddings, ctx.group_id, ctx.query, SENTENCE_TOP_K);
        let ppr_evidence_fut = ppr_evidence(ctx.graph, ctx.group_id, &ppr_ranked);
        let (sentence_evidence, ppr_evidence) = tokio::join!(sentence_evidence_fut, ppr_evidence_fut);
        let sentence_evidence = sentence_evidence?;
        let (ppr_items, ppr_citations) = ppr_evidence?;

        let mut evidence = merge_dedup(ppr_items, sentence_evidence.evidence);
        let mut citations = ppr_citations;
        citations.extend(sentence_evidence.citations);

        if ctx.options.rerank && !evidence.is_empty() {
            ctx.check_cancelled()?;
            let candidates: Vec<RerankCandidate> = evidence
                .iter()
                .map(|e| RerankCandidate { passage_id: e.id.clone(), text: e.text.clone() })
                .collect();
            let reranked = ctx.embeddings.rerank(ctx.query, &candidates).await?;
            evidence = reranked
                .into_iter()
                .take(RERANK_TOP_K)
                .filter_map(|r| {
                    evidence.iter().find(|e| e.id == r.passage_id).cloned().map(|mut e| {
                        e.score = r.score;
                        e
                    })
                })
                .collect();
        }

        let confidence = if evidence.is_empty() {
            0.0
        } else {
            evidence.iter().map(|e| e.score).fold(f32::MIN, f32::max).clamp(0.0, 1.0)
        };

        Ok(RouteOutcome {
            thoughts: vec![format!(
                "seeded PPR with {} weighted entities, merged {} evidence items",
                seeds.weights.len(),
                evidence.len()
            )],
            evidence,
            citations,
            confidence,
        })
    }
}

async fn ppr_evidence(
    graph: &graphrag_graph::GraphStore,
    group_id: &str,
    ppr_ranked: &[(String, f32)],
) -> Result<(Vec<EvidenceItem>, Vec<Citation>), RetrievalError> {
    let entity_ids: std::collections::HashSet<&str> = ppr_ranked.iter().map(|(id, _)| id.as_str()).collect();
    let scores: std::collections::HashMap<&str, f32> = ppr_ranked.iter().map(|(id, s)| (id.as_str(), *s)).collect();

    let nodes = graph.scan_nodes(group_id)?;
    let mut chunks: Vec<TextChunk> = Vec::new();
    for node in &nodes {
        if let Node::TextChunk(chunk) = node {
            let mentions = graph.get_deterministic_edges(group_id, &chunk.id, DeterministicEdgeKind::Mentions)?;
            if mentions.iter().any(|e| entity_ids.contains(e.to.as_str())) {
                chunks.push(chunk.clone());
            }
        }
    }

    let mut evidence = Vec::new();
    let mut citations = Vec::new();
    for chunk in chunks {
        let mentions = graph.get_deterministic_edges(group_id, &chunk.id, DeterministicEdgeKind::Mentions)?;
        let best_score = mentions
            .iter()
            .filter_map(|e| scores.get(e.to.as_str()).copied())
            .fold(0.0f32, f32::max);
        evidence.push(EvidenceItem { id: chunk.id.clone(), text: chunk.text.clone(), score: best_score });
        citations.push(Citation { node_id: chunk.id.clone(), excerpt: chunk.text.chars().take(160).collect() });
    }
    Ok((evidence, citations))
}

/// Merges PPR-derived and sentence-vector-derived evidence, keeping the
/// higher-scored copy of any id that both sides produced independently.
fn merge_dedup(primary: Vec<EvidenceItem>, secondary: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    let mut by_id: std::collections::HashMap<String, EvidenceItem> = std::collections::HashMap::new();
    for item in primary.into_iter().chain(secondary) {
        by_id
            .entry(item.id.clone())
            .and_modify(|existing| {
                if item.score > existing.score {
                    *existing = item.clone();
                }
            })
            .or_insert(item);
    }
    let mut out: Vec<EvidenceItem> = by_id.into_values().collect();
    out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    out
}
