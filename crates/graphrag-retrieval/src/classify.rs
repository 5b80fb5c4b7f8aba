//! The orchestrator's lightweight deterministic query classifier (§4.8):
//! keyword-based, no model call. Its output picks both a [`WeightProfile`]
//! and, by default, which route handles the query.

use crate::types::{QueryIntent, RouteKind};

/// Classifies `query` into an intent, used to select the seed-weight
/// profile and (absent an explicit override) the route.
pub fn classify_intent(query: &str) -> QueryIntent {
    let q = query.to_ascii_lowercase();

    if contains_any(&q, &["across", "overall", "themes", "recur", "survey"]) {
        QueryIntent::ThematicSurvey
    } else if contains_any(&q, &["compare", "versus", " vs ", "difference between"]) {
        QueryIntent::CrossDocComparison
    } else if contains_any(&q, &["does", "match the", "consistent with", "conflict"]) {
        QueryIntent::MultiHop
    } else if contains_any(&q, &["clause", "terms", "warranty", "provision", "section"]) {
        QueryIntent::ClauseAnalysis
    } else {
        QueryIntent::FactExtraction
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Default route selection given an intent, absent an explicit override
/// (§16: Route 5 is the target state that subsumes Routes 3 and 4; Route 2
/// stays the default for plain fact extraction, where its zero-LLM-call
/// anchor+expand path is both cheaper and, per §4.4, empirically precise
/// enough that a cross-encoder rerank would not change the outcome).
pub fn default_route_for_intent(intent: QueryIntent) -> RouteKind {
    match intent {
        QueryIntent::FactExtraction => RouteKind::Local,
        _ => RouteKind::Unified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_fact_extraction() {
        assert_eq!(classify_intent("Who is the Agent?"), QueryIntent::FactExtraction);
    }

    #[test]
    fn classifies_clause_analysis() {
        assert_eq!(
            classify_intent("What are the warranty terms?"),
            QueryIntent::ClauseAnalysis
        );
    }

    #[test]
    fn classifies_cross_doc_comparison() {
        assert_eq!(
            classify_intent("Compare termination clauses"),
            QueryIntent::CrossDocComparison
        );
    }

    #[test]
    fn classifies_thematic_survey() {
        assert_eq!(
            classify_intent("What themes recur across the corpus?"),
            QueryIntent::ThematicSurvey
        );
    }

    #[test]
    fn classifies_multi_hop() {
        assert_eq!(
            classify_intent("Does the invoice match the contract?"),
            QueryIntent::MultiHop
        );
    }

    #[test]
    fn default_route_picks_local_for_fact_extraction() {
        assert_eq!(default_route_for_intent(QueryIntent::FactExtraction), RouteKind::Local);
    }

    #[test]
    fn default_route_picks_unified_otherwise() {
        assert_eq!(default_route_for_intent(QueryIntent::ThematicSurvey), RouteKind::Unified);
    }
}
