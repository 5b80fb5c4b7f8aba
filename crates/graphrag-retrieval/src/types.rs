//! Shared value types passed between the seed resolver, the four routes, and
//! the orchestrator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A user-facing query intent, used to pick a route and a seed-weight
/// profile (§4.3's table, §4.8's classifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryIntent {
    FactExtraction,
    ClauseAnalysis,
    CrossDocComparison,
    ThematicSurvey,
    MultiHop,
}

/// Seed Resolver tier weights, `w1 + w2 + w3 == 1.0`. Hand-tuned per intent
/// per §4.3; [`WeightProfile::custom`] is the escape hatch for a future
/// learned profile (§16) without a code change at the call sites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub w1: f32,
    pub w2: f32,
    pub w3: f32,
}

impl WeightProfile {
    pub fn custom(w1: f32, w2: f32, w3: f32) -> Self {
        let total = w1 + w2 + w3;
        if total <= 0.0 {
            return Self { w1: 1.0, w2: 0.0, w3: 0.0 };
        }
        Self { w1: w1 / total, w2: w2 / total, w3: w3 / total }
    }

    pub fn for_intent(intent: QueryIntent) -> Self {
        match intent {
            QueryIntent::FactExtraction => Self { w1: 0.6, w2: 0.3, w3: 0.1 },
            QueryIntent::ClauseAnalysis => Self { w1: 0.3, w2: 0.5, w3: 0.2 },
            QueryIntent::CrossDocComparison => Self { w1: 0.2, w2: 0.3, w3: 0.5 },
            QueryIntent::ThematicSurvey => Self { w1: 0.1, w2: 0.2, w3: 0.7 },
            QueryIntent::MultiHop => Self { w1: 0.5, w2: 0.3, w3: 0.2 },
        }
    }

    /// `damping = 0.70 + 0.20 * w1` (§4.3). Higher T1 weight narrows the PPR
    /// walk; higher T3 weight lets it drift further from the seeds.
    pub fn damping(&self) -> f32 {
        0.70 + 0.20 * self.w1
    }
}

/// A single piece of evidence handed to the synthesizer: a paragraph, a
/// community claim, or a chunk, each carrying its own retrieval score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// A citation attached to the final answer, always traceable back to a
/// specific sentence or chunk id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub node_id: String,
    pub excerpt: String,
}

/// Which route produced an answer. Recorded on [`crate::orchestrator::Answer`]
/// for observability and for the version-registry/canary split described in
/// §9's design notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    Local,
    Global,
    Drift,
    Unified,
}

/// Cooperative cancellation: every route stage checks this between LLM and
/// graph calls (§4.8). Cloning shares the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-query knobs the caller (the server layer) can set.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Bypasses the classifier and forces a specific route. Used by tests
    /// and by the legacy Route 3/4 endpoints kept alive for canary/version
    /// comparisons (§9).
    pub force_route: Option<RouteKind>,
    /// Whether the cross-encoder reranker may be consulted (disabled by
    /// default per §16's open-question decision).
    pub rerank: bool,
    pub cancellation: CancellationToken,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            force_route: None,
            rerank: false,
            cancellation: CancellationToken::new(),
        }
    }
}
