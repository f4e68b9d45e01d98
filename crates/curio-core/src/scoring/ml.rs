//! ML-Enhanced engine: the context-aware score times a personalization
//! factor in [0.8, 1.2] derived from interaction history (1.0 without it).

use curio_types::candidate::Candidate;
use curio_types::config::PersonalizationBounds;
use curio_types::error::EngineError;

use super::context::ContextAwareEngine;
use super::{ScoredCandidate, ScoringContext};
use crate::repository::content::ContentRepository;

#[derive(Debug, Clone)]
pub struct MlEnhancedEngine {
    context: ContextAwareEngine,
    bounds: PersonalizationBounds,
}

impl MlEnhancedEngine {
    pub fn new(context: ContextAwareEngine, bounds: PersonalizationBounds) -> Self {
        Self { context, bounds }
    }

    pub async fn score<'a, R: ContentRepository>(
        &self,
        candidates: &'a [Candidate],
        ctx: &ScoringContext<'_, R>,
    ) -> Result<Vec<ScoredCandidate<'a>>, EngineError> {
        let mut scored = self.context.score(candidates, ctx).await?;
        let Some(profile) = ctx.profile.filter(|p| !p.is_empty()) else {
            return Ok(scored);
        };

        for item in &mut scored {
            let factor = profile.factor(item.candidate, &self.bounds);
            item.score = (item.score * factor).clamp(0.0, 1.0);
            if factor > 1.0 {
                item.reason.push_str("; close to what you engage with");
            } else if factor < 1.0 {
                item.reason.push_str("; less like what you usually open");
            }
        }
        Ok(scored)
    }
}
