//! BasicSimilarity: the last resort of the fallback chain.
//!
//! Scores purely by technology overlap and needs nothing beyond the
//! candidate list already fetched, so it cannot fail.

use std::collections::BTreeSet;

use curio_types::candidate::{Candidate, normalize_technology};
use curio_types::intent::Intent;
use curio_types::request::RecommendationRequest;

use super::similarity::jaccard;
use super::{ScoredCandidate, join_reasons};

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSimilarityEngine;

impl BasicSimilarityEngine {
    /// Jaccard overlap between the user's terms and each candidate's tags.
    ///
    /// The user's terms are the technology profile, or the intent keywords
    /// when the profile is empty.
    pub fn score<'a>(
        &self,
        candidates: &'a [Candidate],
        request: &RecommendationRequest,
        intent: Option<&Intent>,
    ) -> Vec<ScoredCandidate<'a>> {
        let mut terms: BTreeSet<String> = request.technology_profile.iter().cloned().collect();
        if terms.is_empty() {
            if let Some(intent) = intent {
                terms.extend(
                    intent
                        .keywords
                        .iter()
                        .map(|k| normalize_technology(k))
                        .filter(|k| !k.is_empty()),
                );
            }
        }

        candidates
            .iter()
            .map(|candidate| {
                let signals = candidate.technology_signals();
                let overlap = jaccard(&terms, &signals);
                let shared = terms.intersection(&signals).count();
                let reasons = if shared > 0 {
                    vec![format!("shares {shared} technologies with your request")]
                } else {
                    Vec::new()
                };
                ScoredCandidate {
                    candidate,
                    score: overlap,
                    reason: join_reasons(reasons),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use curio_types::intent::{IntentSource, IntentType};

    use super::*;
    use crate::testing::candidate;

    #[test]
    fn test_scores_by_profile_overlap() {
        let request = RecommendationRequest::new("u", "x").with_technologies(["react"]);
        let mut no_embedding = candidate(1, "a", &["react", "hooks"], 9, 0);
        no_embedding.embedding = None;
        let candidates = vec![no_embedding, candidate(2, "b", &["vue"], 9, 0)];

        let scored = BasicSimilarityEngine.score(&candidates, &request, None);
        assert_eq!(scored[0].score, 0.5);
        assert_eq!(scored[1].score, 0.0);
        assert!(scored[0].reason.contains("shares 1"));
    }

    #[test]
    fn test_keywords_used_when_profile_empty() {
        let request = RecommendationRequest::new("u", "learn react hooks");
        let intent = Intent {
            intent_type: IntentType::Learn,
            confidence: 0.5,
            keywords: vec!["react".to_string(), "hooks".to_string()],
            source: IntentSource::HeuristicFallback,
        };
        let candidates = vec![candidate(1, "a", &["react", "hooks"], 9, 0)];
        let scored = BasicSimilarityEngine.score(&candidates, &request, Some(&intent));
        assert_eq!(scored[0].score, 1.0);
    }

    #[test]
    fn test_empty_candidates() {
        let request = RecommendationRequest::new("u", "x");
        assert!(BasicSimilarityEngine.score(&[], &request, None).is_empty());
    }
}
