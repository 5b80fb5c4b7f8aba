//! The `Route` sum type (§9, §13): four independently testable strategies
//! sharing one capability set. No inheritance chain — each variant is a
//! frozen implementation, composed from the graph store, embedding gateway,
//! and synthesizer injected through [`RouteContext`].

use async_trait::async_trait;

use graphrag_embedding::EmbeddingGateway;
use graphrag_graph::GraphStore;

use crate::error::RetrievalError;
use crate::ner::EntityExtractor;
use crate::routes::{drift::DriftRoute, global::GlobalRoute, local::LocalRoute, unified::UnifiedRoute};
use crate::seed_resolver::SeedSet;
use crate::synthesis::Synthesizer;
use crate::types::{Citation, CancellationToken, EvidenceItem, QueryIntent, QueryOptions, RouteKind, WeightProfile};

/// Everything a route needs to execute one query. Borrowed, never owned, so
/// the orchestrator can build it once per query and hand it to whichever
/// route variant was selected.
pub struct RouteContext<'a> {
    pub query: &'a str,
    pub group_id: &'a str,
    pub intent: QueryIntent,
    pub profile: WeightProfile,
    pub graph: &'a GraphStore,
    pub embeddings: &'a EmbeddingGateway,
    pub entity_extractor: &'a dyn EntityExtractor,
    pub synthesizer: &'a dyn Synthesizer,
    pub options: &'a QueryOptions,
    /// Pre-resolved seeds, populated by the orchestrator only for routes
    /// where [`RouteStrategy::needs_seed_resolution`] is true.
    pub seeds: Option<&'a SeedSet>,
}

impl RouteContext<'_> {
    pub fn cancellation(&self) -> &CancellationToken {
        &self.options.cancellation
    }

    pub fn check_cancelled(&self) -> Result<(), RetrievalError> {
        if self.cancellation().is_cancelled() {
            Err(RetrievalError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// What a route produced before synthesis: deduplicated evidence, citations
/// already traceable to source nodes, and a confidence score the
/// orchestrator uses to decide whether to retry (§4.8).
#[derive(Debug, Clone, Default)]
pub struct RouteOutcome {
    pub evidence: Vec<EvidenceItem>,
    pub citations: Vec<Citation>,
    pub confidence: f32,
    pub thoughts: Vec<String>,
}

/// Rough cost signal for observability and the version-registry's canary
/// comparisons (§9) — not used to gate execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteCost {
    pub estimated_llm_calls: u32,
    pub estimated_graph_calls: u32,
}

#[async_trait]
pub trait RouteStrategy: Send + Sync {
    fn kind(&self) -> RouteKind;

    /// Whether this route is a sensible default for `intent`. The
    /// orchestrator still honors an explicit [`QueryOptions::force_route`]
    /// override regardless of this answer.
    fn classify_applicable(&self, intent: QueryIntent) -> bool;

    /// Whether the orchestrator must resolve seeds (§4.3) before calling
    /// [`RouteStrategy::execute`]. `false` for the anchor-based routes
    /// (Local, Global), which never consult PPR.
    fn needs_seed_resolution(&self) -> bool;

    fn cost_estimate(&self) -> RouteCost;

    async fn execute(&self, ctx: &RouteContext<'_>) -> Result<RouteOutcome, RetrievalError>;
}

/// The sum type itself. Delegates to whichever strategy struct backs the
/// chosen variant; adding a fifth route means adding a variant here, not
/// touching the other four.
pub enum Route {
    Local(LocalRoute),
    Global(GlobalRoute),
    Drift(DriftRoute),
    Unified(UnifiedRoute),
}

impl Route {
    pub fn for_kind(kind: RouteKind) -> Self {
        match kind {
            RouteKind::Local => Route::Local(LocalRoute),
            RouteKind::Global => Route::Global(GlobalRoute),
            RouteKind::Drift => Route::Drift(DriftRoute),
            RouteKind::Unified => Route::Unified(UnifiedRoute::default()),
        }
    }

    pub fn kind(&self) -> RouteKind {
        match self {
            Route::Local(r) => r.kind(),
            Route::Global(r) => r.kind(),
            Route::Drift(r) => r.kind(),
            Route::Unified(r) => r.kind(),
        }
    }

    pub fn classify_applicable(&self, intent: QueryIntent) -> bool {
        match self {
            Route::Local(r) => r.classify_applicable(intent),
            Route::Global(r) => r.classify_applicable(intent),
            Route::Drift(r) => r.classify_applicable(intent),
            Route::Unified(r) => r.classify_applicable(intent),
        }
    }

    pub fn needs_seed_resolution(&self) -> bool {
        match self {
            Route::Local(r) => r.needs_seed_resolution(),
            Route::Global(r) => r.needs_seed_resolution(),
            Route::Drift(r) => r.needs_seed_resolution(),
            Route::Unified(r) => r.needs_seed_resolution(),
        }
    }

    pub fn cost_estimate(&self) -> RouteCost {
        match self {
            Route::Local(r) => r.cost_estimate(),
            Route::Global(r) => r.cost_estimate(),
            Route::Drift(r) => r.cost_estimate(),
            Route::Unified(r) => r.cost_estimate(),
        }
    }

    pub async fn execute(&self, ctx: &RouteContext<'_>) -> Result<RouteOutcome, RetrievalError> {
        match self {
            Route::Local(r) => r.execute(ctx).await,
            Route::Global(r) => r.execute(ctx).await,
            Route::Drift(r) => r.execute(ctx).await,
            Route::Unified(r) => r.execute(ctx).await,
        }
    }
}
