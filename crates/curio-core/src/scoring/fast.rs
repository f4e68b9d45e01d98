//! Fast-Semantic engine: technology overlap, embedding cosine and quality.
//!
//! Candidates without an embedding are excluded (not zero-filled). When
//! none has one the engine fails so the fallback chain can take over.

use curio_types::candidate::Candidate;
use curio_types::config::FastSemanticWeights;
use curio_types::error::EngineError;

use super::similarity::{cosine, jaccard};
use super::{ScoredCandidate, ScoringContext, join_reasons};
use crate::repository::content::ContentRepository;

#[derive(Debug, Clone)]
pub struct FastSemanticEngine {
    weights: FastSemanticWeights,
}

impl FastSemanticEngine {
    pub fn new(weights: FastSemanticWeights) -> Self {
        Self { weights }
    }

    pub async fn score<'a, R: ContentRepository>(
        &self,
        candidates: &'a [Candidate],
        ctx: &ScoringContext<'_, R>,
    ) -> Result<Vec<ScoredCandidate<'a>>, EngineError> {
        if !candidates.is_empty() && !candidates.iter().any(Candidate::has_embedding) {
            return Err(EngineError::EmbeddingUnavailable(
                "no candidate embeddings".to_string(),
            ));
        }
        let query = ctx.query_embedding().await?;
        let profile = ctx.profile_terms();
        let w = &self.weights;

        let scored = candidates
            .iter()
            .filter_map(|candidate| {
                let embedding = candidate.embedding.as_deref().filter(|e| !e.is_empty())?;
                let overlap = jaccard(&profile, &candidate.technologies);
                let similarity = cosine(&query, embedding);
                let score = w.technology_overlap * overlap
                    + w.cosine_similarity * similarity
                    + w.quality * candidate.quality_ratio();

                let mut reasons = Vec::new();
                if overlap > 0.0 {
                    let shared = profile.intersection(&candidate.technologies).count();
                    reasons.push(format!("matches {shared} of your technologies"));
                }
                if similarity >= 0.5 {
                    reasons.push("close semantic match".to_string());
                }

                Some(ScoredCandidate {
                    candidate,
                    score: score.clamp(0.0, 1.0),
                    reason: join_reasons(reasons),
                })
            })
            .collect();
        Ok(scored)
    }
}
