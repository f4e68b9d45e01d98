//! Post-processing of engine output: quality and score floors, diversity
//! re-ranking and truncation.
//!
//! Output order is score descending, then `created_at` descending, then
//! candidate id ascending.

use std::cmp::Ordering;

use curio_types::candidate::Candidate;
use curio_types::config::ScoringConfig;
use curio_types::recommendation::{EngineKind, RankedRecommendation};
use curio_types::request::RecommendationRequest;

use crate::scoring::ScoredCandidate;
use crate::scoring::similarity::shared_count;

/// Ranking order: higher score first, then fresher, then lower id.
pub fn rank_order(a_score: f64, a: &Candidate, b_score: f64, b: &Candidate) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn post_process(
    scored: Vec<ScoredCandidate<'_>>,
    request: &RecommendationRequest,
    engine: EngineKind,
    config: &ScoringConfig,
) -> Vec<RankedRecommendation> {
    let mut remaining: Vec<ScoredCandidate<'_>> = scored
        .into_iter()
        .filter(|s| s.candidate.quality_score >= request.quality_threshold)
        .filter(|s| s.score.is_finite() && s.score >= config.score_floor)
        .map(|mut s| {
            s.score = s.score.clamp(0.0, 1.0);
            s
        })
        .collect();

    let penalty = 1.0 - request.diversity_weight;
    let threshold = config.diversity_overlap_threshold.max(1);
    let mut selected: Vec<ScoredCandidate<'_>> = Vec::with_capacity(request.max_results);

    while selected.len() < request.max_results && !remaining.is_empty() {
        let best = remaining
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| rank_order(a.score, a.candidate, b.score, b.candidate))
            .map(|(i, _)| i);
        let Some(best) = best else { break };
        let pick = remaining.swap_remove(best);

        if penalty < 1.0 {
            for other in &mut remaining {
                if shared_count(&pick.candidate.technologies, &other.candidate.technologies) >= threshold {
                    other.score *= penalty;
                }
            }
        }
        selected.push(pick);
    }

    selected
        .into_iter()
        .map(|s| RankedRecommendation {
            candidate_id: s.candidate.id,
            score: s.score,
            reason: s.reason,
            engine_used: engine,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use curio_types::identity::CandidateId;

    use super::*;
    use crate::testing::candidate;

    fn scored(candidate: &Candidate, score: f64) -> ScoredCandidate<'_> {
        ScoredCandidate {
            candidate,
            score,
            reason: "r".to_string(),
        }
    }

    fn ids(recs: &[RankedRecommendation]) -> Vec<i64> {
        recs.iter().map(|r| r.candidate_id.0).collect()
    }

    #[test]
    fn test_quality_and_floor_filters() {
        let items = vec![
            candidate(1, "a", &["x"], 9, 0),
            candidate(2, "b", &["y"], 5, 0),
            candidate(3, "c", &["z"], 9, 0),
        ];
        let request = RecommendationRequest::new("u", "q");
        let recs = post_process(
            vec![scored(&items[0], 0.9), scored(&items[1], 0.95), scored(&items[2], 0.1)],
            &request,
            EngineKind::FastSemantic,
            &ScoringConfig::default(),
        );
        assert_eq!(ids(&recs), vec![1]);
        assert_eq!(recs[0].engine_used, EngineKind::FastSemantic);
    }

    #[test]
    fn test_tie_break_fresher_then_lower_id() {
        let items = vec![
            candidate(5, "a", &["a"], 9, 100),
            candidate(3, "b", &["b"], 9, 200),
            candidate(4, "c", &["c"], 9, 200),
            candidate(9, "d", &["d"], 9, 0),
        ];
        let request = RecommendationRequest::new("u", "q");
        let recs = post_process(
            items.iter().map(|c| scored(c, 0.5)).collect(),
            &request,
            EngineKind::ContextAware,
            &ScoringConfig::default(),
        );
        assert_eq!(ids(&recs), vec![3, 4, 5, 9]);
    }

    #[test]
    fn test_diversity_pushes_overlapping_item_down() {
        let items = vec![
            candidate(1, "a", &["react", "hooks", "redux"], 9, 0),
            candidate(2, "b", &["react", "hooks", "context"], 9, 0),
            candidate(3, "c", &["vue"], 9, 0),
            candidate(4, "d", &["rust"], 9, 0),
        ];
        let request = RecommendationRequest::new("u", "q");
        let recs = post_process(
            vec![
                scored(&items[0], 0.9),
                scored(&items[1], 0.8),
                scored(&items[2], 0.6),
                scored(&items[3], 0.5),
            ],
            &request,
            EngineKind::ContextAware,
            &ScoringConfig::default(),
        );
        assert_eq!(ids(&recs), vec![1, 3, 2, 4]);
        assert!((recs[2].score - 0.56).abs() < 1e-9);
        for pair in recs.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_zero_diversity_weight_keeps_raw_order() {
        let items = vec![
            candidate(1, "a", &["react", "hooks"], 9, 0),
            candidate(2, "b", &["react", "hooks"], 9, 0),
            candidate(3, "c", &["vue"], 9, 0),
        ];
        let mut request = RecommendationRequest::new("u", "q");
        request.diversity_weight = 0.0;
        let recs = post_process(
            vec![scored(&items[0], 0.9), scored(&items[1], 0.8), scored(&items[2], 0.6)],
            &request,
            EngineKind::ContextAware,
            &ScoringConfig::default(),
        );
        assert_eq!(ids(&recs), vec![1, 2, 3]);
        assert!((recs[1].score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_truncates_to_max_results() {
        let items: Vec<Candidate> = (1..=8).map(|i| candidate(i, "t", &[], 9, i)).collect();
        let request = RecommendationRequest::new("u", "q").with_max_results(3);
        let recs = post_process(
            items.iter().map(|c| scored(c, 0.5)).collect(),
            &request,
            EngineKind::BasicSimilarity,
            &ScoringConfig::default(),
        );
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].candidate_id, CandidateId(8));
    }

    #[test]
    fn test_empty_input() {
        let request = RecommendationRequest::new("u", "q");
        assert!(post_process(Vec::new(), &request, EngineKind::FastSemantic, &ScoringConfig::default()).is_empty());
    }
}
