//! Query-time named entity recognition (§4.3 T1, §4.6 stage 2).
//!
//! Production NER is LLM-backed; this crate only depends on the capability,
//! not the provider, so tests and cost-sensitive deployments can swap in a
//! cheaper extractor without touching the resolver or the routes.

/// Extracts surface forms (candidate entity mentions) from a query. **Must**
/// be run on the original query text, never a decomposed sub-question —
/// sub-question NER was measured at 38% hallucination (§4.3).
pub trait EntityExtractor: Send + Sync {
    fn extract_surface_forms(&self, query: &str) -> Vec<String>;
}

/// Heuristic stand-in for an LLM NER call: treats runs of capitalized words
/// as candidate surface forms. Deterministic, good enough to exercise the
/// resolver and the routes in tests without a live model.
pub struct HeuristicEntityExtractor;

impl EntityExtractor for HeuristicEntityExtractor {
    fn extract_surface_forms(&self, query: &str) -> Vec<String> {
        let mut forms = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for word in query.split_whitespace() {
            let cleaned = word.trim_matches(|c: char| !c.is_alphanumeric());
            let starts_upper = cleaned.chars().next().is_some_and(|c| c.is_uppercase());
            if starts_upper && !cleaned.is_empty() {
                current.push(cleaned);
            } else if !current.is_empty() {
                forms.push(current.join(" "));
                current.clear();
            }
        }
        if !current.is_empty() {
            forms.push(current.join(" "));
        }
        forms.dedup();
        forms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_runs_of_capitalized_words() {
        let extractor = HeuristicEntityExtractor;
        let forms = extractor.extract_surface_forms("Who is the Agent named in the Acme Corp contract?");
        assert!(forms.contains(&"Agent".to_string()));
        assert!(forms.contains(&"Acme Corp".to_string()));
    }

    #[test]
    fn query_with_no_capitals_yields_nothing() {
        let extractor = HeuristicEntityExtractor;
        assert!(extractor.extract_surface_forms("what was the total due").is_empty());
    }
}
