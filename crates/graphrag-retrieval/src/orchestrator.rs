//! The query orchestrator (§4.8): classify → resolve seeds (if the chosen
//! route needs them) → execute the route → retry once on low confidence →
//! synthesize → return. A thin state machine, not a framework — each stage
//! is one method, and the state itself is just "which stage did we last
//! complete", recovered from local variables rather than a persisted enum.

use graphrag_embedding::EmbeddingGateway;
use graphrag_graph::GraphStore;

use crate::classify::{classify_intent, default_route_for_intent};
use crate::error::RetrievalError;
use crate::ner::EntityExtractor;
use crate::route::{Route, RouteContext};
use crate::seed_resolver::SeedResolver;
use crate::synthesis::Synthesizer;
use crate::types::{Citation, QueryIntent, QueryOptions, RouteKind, WeightProfile};

/// Confidence floor below which the orchestrator retries once with the
/// route's own outcome as extra guidance, per §4.8's single-retry policy.
const CONFIDENCE_RETRY_FLOOR: f32 = 0.4;
const MAX_RETRIES: u32 = 1;

/// The orchestrator's final product: an answer plus enough metadata to
/// reproduce or audit how it was produced.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Answer {
    pub text: String,
    pub citations: Vec<Citation>,
    pub route: RouteKind,
    pub intent: QueryIntent,
    pub confidence: f32,
    pub attempts: u32,
}

pub struct Orchestrator<'a> {
    graph: &'a GraphStore,
    embeddings: &'a EmbeddingGateway,
    entity_extractor: &'a dyn EntityExtractor,
    synthesizer: &'a dyn Synthesizer,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        graph: &'a GraphStore,
        embeddings: &'a EmbeddingGateway,
        entity_extractor: &'a dyn EntityExtractor,
        synthesizer: &'a dyn Synthesizer,
    ) -> Self {
        Self { graph, embeddings, entity_extractor, synthesizer }
    }

    pub async fn answer(&self, query: &str, group_id: &str, options: QueryOptions) -> Result<Answer, RetrievalError> {
        if options.cancellation.is_cancelled() {
            return Err(RetrievalError::Cancelled);
        }

        // Classified.
        let intent = classify_intent(query);
        let profile = WeightProfile::for_intent(intent);
        let route_kind = options.force_route.unwrap_or_else(|| default_route_for_intent(intent));
        let route = Route::for_kind(route_kind);

        // SeedsResolved, only if this route consults PPR.
        let seeds = if route.needs_seed_resolution() {
            let resolver = SeedResolver::new(self.graph, self.embeddings, self.entity_extractor);
            match resolver.resolve(query, group_id, profile).await {
                Ok(seeds) => Some(seeds),
                // §4.3's empty-seed-set edge case: degrade to a route that
                // doesn't need seeds rather than failing the whole query.
                Err(RetrievalError::EmptySeedSet(_)) => None,
                Err(other) => return Err(other),
            }
        } else {
            None
        };

        let route = if route.needs_seed_resolution() && seeds.is_none() {
            Route::for_kind(RouteKind::Local)
        } else {
            route
        };

        let ctx = RouteContext {
            query,
            group_id,
            intent,
            profile,
            graph: self.graph,
            embeddings: self.embeddings,
            entity_extractor: self.entity_extractor,
            synthesizer: self.synthesizer,
            options: &options,
            seeds: seeds.as_ref(),
        };

        // Retrieved, with a single confidence-triggered retry (§4.8).
        let mut outcome = route.execute(&ctx).await?;
        let mut attempts = 1;
        if outcome.confidence < CONFIDENCE_RETRY_FLOOR && attempts <= MAX_RETRIES {
            ctx.check_cancelled()?;
            let retried = route.execute(&ctx).await?;
            attempts += 1;
            if retried.confidence > outcome.confidence {
                outcome = retried;
            }
        }

        ctx.check_cancelled()?;

        // Synthesised.
        let synthesis_instructions = synthesis_instructions_for(route_kind);
        let synthesized = self
            .synthesizer
            .synthesize(query, &outcome.evidence, synthesis_instructions)
            .await?;

        // Returned.
        Ok(Answer {
            text: synthesized.answer_text,
            citations: merge_citations(synthesized.citations, outcome.citations),
            route: route_kind,
            intent,
            confidence: outcome.confidence,
            attempts,
        })
    }
}

fn synthesis_instructions_for(route: RouteKind) -> &'static str {
    match route {
        RouteKind::Local => "answer with the specific fact; cite the paragraph it came from",
        RouteKind::Global => "synthesize across the cited community claims; note where they disagree",
        RouteKind::Drift => "trace the multi-hop reasoning chain explicitly before stating the answer",
        RouteKind::Unified => "answer directly; cite every claim by its evidence id",
    }
}

fn merge_citations(primary: Vec<Citation>, secondary: Vec<Citation>) -> Vec<Citation> {
    let mut out = primary;
    for citation in secondary {
        if !out.contains(&citation) {
            out.push(citation);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ner::HeuristicEntityExtractor;
    use crate::synthesis::StubSynthesizer;
    use graphrag_embedding::EmbeddingConfig;
    use graphrag_graph::types::{Entity, Node, EMBEDDING_DIM};
    use graphrag_graph::GraphStoreConfig;

    fn seeded_store() -> GraphStore {
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        let mut emb = vec![0.0f32; EMBEDDING_DIM];
        emb[0] = 1.0;
        store
            .put_node(Node::Entity(Entity {
                id: "entity-acme".into(),
                group_id: "g1".into(),
                canonical_name: "Acme Corp".into(),
                aliases: vec!["Acme".into()],
                embedding_v2: emb,
            }))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn answers_fact_extraction_query_via_local_route() {
        let store = seeded_store();
        let gateway = EmbeddingGateway::new(EmbeddingConfig { mode: "stub".into(), ..Default::default() });
        let extractor = HeuristicEntityExtractor;
        let synthesizer = StubSynthesizer;
        let orchestrator = Orchestrator::new(&store, &gateway, &extractor, &synthesizer);

        let answer = orchestrator
            .answer("Who is the Agent for Acme Corp?", "g1", QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(answer.route, RouteKind::Local);
        assert_eq!(answer.intent, QueryIntent::FactExtraction);
        assert!(answer.attempts >= 1);
    }

    #[tokio::test]
    async fn degrades_to_local_route_when_seed_resolution_is_empty() {
        let store = GraphStore::new(GraphStoreConfig::default()).unwrap();
        let gateway = EmbeddingGateway::new(EmbeddingConfig { mode: "stub".into(), ..Default::default() });
        let extractor = HeuristicEntityExtractor;
        let synthesizer = StubSynthesizer;
        let orchestrator = Orchestrator::new(&store, &gateway, &extractor, &synthesizer);

        let answer = orchestrator
            .answer("What themes recur across the corpus?", "g1", QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(answer.route, RouteKind::Local);
    }

    #[tokio::test]
    async fn force_route_overrides_the_classifier() {
        let store = seeded_store();
        let gateway = EmbeddingGateway::new(EmbeddingConfig { mode: "stub".into(), ..Default::default() });
        let extractor = HeuristicEntityExtractor;
        let synthesizer = StubSynthesizer;
        let orchestrator = Orchestrator::new(&store, &gateway, &extractor, &synthesizer);

        let options = QueryOptions { force_route: Some(RouteKind::Global), ..Default::default() };
        let answer = orchestrator
            .answer("Who is the Agent for Acme Corp?", "g1", options)
            .await
            .unwrap();

        assert_eq!(answer.route, RouteKind::Global);
    }
}
