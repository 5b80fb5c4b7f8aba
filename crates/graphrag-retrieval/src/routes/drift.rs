//! Route 4 — DRIFT multi-hop search (§4.6). Cross-document reasoning via
//! query decomposition, per-subquery entity resolution, PPR, and bounded
//! beam expansion. Kept as a frozen legacy snapshot now that Route 5
//! subsumes it for new traffic (§9); reachable via `force_route`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use graphrag_graph::types::{DeterministicEdgeKind, Node, TextChunk};

use crate::entity_resolution::resolve_surface_form;
use crate::error::RetrievalError;
use crate::route::{RouteContext, RouteCost, RouteOutcome, RouteStrategy};
use crate::routes::anchor_and_expand;
use crate::types::{Citation, EvidenceItem, QueryIntent, RouteKind};

const PPR_DAMPING: f32 = 0.85;
const PPR_TOP_K: usize = 25;
const BEAM_HOPS: usize = 2;
const BEAM_WIDTH: usize = 10;
const MAX_DECOMPOSITIONS: u32 = 2;
const CONFIDENCE_FLOOR: f32 = 0.5;
const COVERAGE_GAP_FILL_TOP_K: usize = 10;

pub struct DriftRoute;

#[async_trait]
impl RouteStrategy for DriftRoute {
    fn kind(&self) -> RouteKind {
        RouteKind::Drift
    }

    fn classify_applicable(&self, intent: QueryIntent) -> bool {
        matches!(intent, QueryIntent::MultiHop | QueryIntent::CrossDocComparison)
    }

    fn needs_seed_resolution(&self) -> bool {
        // Drift resolves its own seeds per sub-question rather than using
        // the orchestrator's single pre-resolved SeedSet (§4.6 stage 2-3).
        false
    }

    fn cost_estimate(&self) -> RouteCost {
        RouteCost { estimated_llm_calls: 6, estimated_graph_calls: 4 }
    }

    async fn execute(&self, ctx: &RouteContext<'_>) -> Result<RouteOutcome, RetrievalError> {
        ctx.check_cancelled()?;
        let mut guidance = String::new();
        let mut attempt = 0;
        let mut outcome;

        loop {
            outcome = self.run_once(ctx, &guidance).await?;
            attempt += 1;
            if outcome.confidence >= CONFIDENCE_FLOOR || attempt >= MAX_DECOMPOSITIONS {
                break;
            }
            guidance = "prior decomposition under-covered the query; decompose more granularly".to_string();
        }

        Ok(outcome)
    }
}

impl DriftRoute {
    async fn run_once(&self, ctx: &RouteContext<'_>, guidance: &str) -> Result<RouteOutcome, RetrievalError> {
        ctx.check_cancelled()?;
        let decomposition_query = if guidance.is_empty() {
            ctx.query.to_string()
        } else {
            format!("{} ({guidance})", ctx.query)
        };
        let subquestions = ctx.synthesizer.decompose(&decomposition_query).await?;

        // Cross-checked against the *original* query's T1 resolution so a
        // hallucinated sub-question entity never survives (§4.6's mitigation
        // for the measured 38% sub-question NER hallucination rate).
        let original_surface_forms = ctx.entity_extractor.extract_surface_forms(ctx.query);
        let mut trusted_entities = HashSet::new();
        for form in &original_surface_forms {
            if let Some(id) = resolve_surface_form(ctx.graph, ctx.embeddings, ctx.group_id, form).await? {
                trusted_entities.insert(id);
            }
        }

        let mut union_entities: Vec<String> = Vec::new();
        for subquestion in &subquestions {
            ctx.check_cancelled()?;
            for form in ctx.entity_extractor.extract_surface_forms(subquestion) {
                if let Some(id) = resolve_surface_form(ctx.graph, ctx.embeddings, ctx.group_id, &form).await? {
                    if trusted_entities.contains(&id) && !union_entities.contains(&id) {
                        union_entities.push(id);
                    }
                }
            }
        }
        // The original query's own entities are always trusted even if no
        // sub-question happened to re-surface them.
        for id in &trusted_entities {
            if !union_entities.contains(id) {
                union_entities.push(id.clone());
            }
        }

        let sentence_fill = anchor_and_expand(
            ctx.graph,
            ctx.embeddings,
            ctx.group_id,
            ctx.query,
            COVERAGE_GAP_FILL_TOP_K,
        )
        .await?;

        if union_entities.is_empty() {
            return Ok(RouteOutcome {
                confidence: crate::routes::heuristic_confidence(&sentence_fill.evidence),
                evidence: sentence_fill.evidence,
                citations: sentence_fill.citations,
                thoughts: vec!["no entities resolved; fell back to sentence-vector evidence only".into()],
            });
        }

        let seed_weights: HashMap<String, f32> = {
            let share = 1.0 / union_entities.len() as f32;
            union_entities.iter().map(|id| (id.clone(), share)).collect()
        };
        let ppr_ranked = ctx.graph.ppr(&seed_weights, PPR_DAMPING, PPR_TOP_K, ctx.group_id)?;
        let ppr_entity_ids: Vec<String> = ppr_ranked.iter().map(|(id, _)| id.clone()).collect();

        let beam_paths = ctx.graph.semantic_beam(&ppr_entity_ids, BEAM_HOPS, BEAM_WIDTH, ctx.group_id)?;
        let avg_path_score = if beam_paths.is_empty() {
            0.0
        } else {
            beam_paths.iter().map(|p| p.score).sum::<f32>() / beam_paths.len() as f32
        };

        let mut surviving_entities: HashSet<String> = HashSet::new();
        for path in &beam_paths {
            surviving_entities.extend(path.nodes.iter().cloned());
        }
        surviving_entities.extend(ppr_entity_ids.iter().cloned());

        let chunks = chunks_mentioning_entities(ctx.graph, ctx.group_id, &surviving_entities)?;
        let mut evidence: Vec<EvidenceItem> = chunks
            .iter()
            .map(|c| EvidenceItem {
                id: c.id.clone(),
                text: c.text.clone(),
                score: avg_path_score.max(0.1),
            })
            .collect();
        let mut citations: Vec<Citation> = chunks
            .iter()
            .map(|c| Citation { node_id: c.id.clone(), excerpt: c.text.chars().take(160).collect() })
            .collect();

        evidence.extend(sentence_fill.evidence);
        citations.extend(sentence_fill.citations);

        let entity_coverage = surviving_entities.len() as f32 / union_entities.len().max(1) as f32;
        let confidence = (entity_coverage * avg_path_score.max(0.1)).clamp(0.0, 1.0);

        Ok(RouteOutcome {
            evidence,
            citations,
            confidence,
            thoughts: vec![format!(
                "decomposed into {} sub-questions, resolved {} trusted entities, {} beam paths",
                subquestions.len(),
                union_entities.len(),
                beam_paths.len()
            )],
        })
    }
}

fn chunks_mentioning_entities(
    graph: &graphrag_graph::GraphStore,
    group_id: &str,
    entity_ids: &HashSet<String>,
) -> Result<Vec<TextChunk>, RetrievalError> {
    let nodes = graph.scan_nodes(group_id)?;
    let mut out = Vec::new();
    for node in nodes {
        if let Node::TextChunk(chunk) = node {
            let mentions = graph.get_deterministic_edges(group_id, &chunk.id, DeterministicEdgeKind::Mentions)?;
            if mentions.iter().any(|e| entity_ids.contains(&e.to)) {
                out.push(chunk);
            }
        }
    }
    Ok(out)
}
