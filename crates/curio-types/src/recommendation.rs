//! Output of the recommender.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::CandidateId;
use crate::intent::Intent;

/// The scoring strategy that produced a result.
///
/// `BasicSimilarity` is the dependency-free last resort of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    FastSemantic,
    ContextAware,
    MlEnhanced,
    BasicSimilarity,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::FastSemantic => write!(f, "fast_semantic"),
            EngineKind::ContextAware => write!(f, "context_aware"),
            EngineKind::MlEnhanced => write!(f, "ml_enhanced"),
            EngineKind::BasicSimilarity => write!(f, "basic_similarity"),
        }
    }
}

/// A single ranked recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub candidate_id: CandidateId,
    /// Normalized to [0, 1].
    pub score: f64,
    /// Short human-readable explanation.
    pub reason: String,
    pub engine_used: EngineKind,
}

/// A recommendation list with the metadata observability tooling needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<RankedRecommendation>,
    /// Engine that produced the final list.
    pub engine_used: EngineKind,
    /// Intent resolved for the request (absent when the deadline hit first).
    pub intent: Option<Intent>,
    /// Whether the list was served from the result cache.
    #[serde(default)]
    pub cache_hit: bool,
    /// Whether any fallback was taken (engine failure or deadline).
    #[serde(default)]
    pub degraded: bool,
}

impl RecommendationOutcome {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_serde() {
        let json = serde_json::to_string(&EngineKind::MlEnhanced).unwrap();
        assert_eq!(json, "\"ml_enhanced\"");
        assert_eq!(EngineKind::BasicSimilarity.to_string(), "basic_similarity");
    }

    #[test]
    fn test_outcome_flags_default_on_deserialize() {
        let json = r#"{"recommendations": [], "engine_used": "fast_semantic", "intent": null}"#;
        let outcome: RecommendationOutcome = serde_json::from_str(json).unwrap();
        assert!(!outcome.cache_hit);
        assert!(!outcome.degraded);
        assert!(outcome.is_empty());
    }
}
