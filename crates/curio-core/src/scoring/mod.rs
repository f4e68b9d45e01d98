//! Scoring engines.
//!
//! The engines form a closed set modelled as the [`Engine`] enum; each
//! variant implements the same `score(candidates, context)` contract and
//! the orchestrator walks a prioritized list of them on failure. All
//! engine scores are in [0, 1].

pub mod basic;
pub mod context;
pub mod fast;
pub mod ml;
pub mod personalization;
pub mod similarity;
pub mod skill;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use curio_types::candidate::{Candidate, normalize_technology};
use curio_types::config::ScoringConfig;
use curio_types::error::EngineError;
use curio_types::intent::Intent;
use curio_types::recommendation::EngineKind;
use curio_types::request::RecommendationRequest;

use crate::embedding::caching::CachingEmbedder;
use crate::repository::content::ContentRepository;

use self::basic::BasicSimilarityEngine;
use self::context::ContextAwareEngine;
use self::fast::FastSemanticEngine;
use self::ml::MlEnhancedEngine;
use self::personalization::PersonalizationProfile;

/// A candidate with its engine score and explanation.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a Candidate,
    pub score: f64,
    pub reason: String,
}

/// Everything an engine may read while scoring one request.
pub struct ScoringContext<'a, R: ContentRepository> {
    pub request: &'a RecommendationRequest,
    pub intent: &'a Intent,
    /// Text the query embedding is computed from (query, else project text).
    pub query_text: &'a str,
    pub repository: &'a R,
    pub embedder: Option<&'a CachingEmbedder>,
    pub profile: Option<&'a PersonalizationProfile>,
    /// Budget for hydrating missing content analyses.
    pub analysis_timeout: Duration,
}

impl<R: ContentRepository> ScoringContext<'_, R> {
    /// The request's technology profile as a set.
    pub fn profile_terms(&self) -> BTreeSet<String> {
        self.request.technology_profile.iter().cloned().collect()
    }

    /// Technology profile plus the intent keywords, normalized.
    pub fn user_terms(&self) -> BTreeSet<String> {
        let mut terms = self.profile_terms();
        terms.extend(
            self.intent
                .keywords
                .iter()
                .map(|k| normalize_technology(k))
                .filter(|k| !k.is_empty()),
        );
        terms
    }

    /// Embedding of the query text; fails when no provider is configured.
    pub async fn query_embedding(&self) -> Result<Arc<Vec<f32>>, EngineError> {
        let embedder = self.embedder.ok_or_else(|| {
            EngineError::EmbeddingUnavailable("no embedding provider configured".to_string())
        })?;
        embedder.embed_one(self.query_text).await
    }
}

/// The closed set of scoring strategies.
#[derive(Debug, Clone)]
pub enum Engine {
    FastSemantic(FastSemanticEngine),
    ContextAware(ContextAwareEngine),
    MlEnhanced(MlEnhancedEngine),
    BasicSimilarity(BasicSimilarityEngine),
}

impl Engine {
    pub fn for_kind(kind: EngineKind, config: &ScoringConfig) -> Self {
        match kind {
            EngineKind::FastSemantic => Engine::FastSemantic(FastSemanticEngine::new(config.fast.clone())),
            EngineKind::ContextAware => {
                Engine::ContextAware(ContextAwareEngine::new(config.context.clone()))
            }
            EngineKind::MlEnhanced => Engine::MlEnhanced(MlEnhancedEngine::new(
                ContextAwareEngine::new(config.context.clone()),
                config.personalization.clone(),
            )),
            EngineKind::BasicSimilarity => Engine::BasicSimilarity(BasicSimilarityEngine),
        }
    }

    pub fn kind(&self) -> EngineKind {
        match self {
            Engine::FastSemantic(_) => EngineKind::FastSemantic,
            Engine::ContextAware(_) => EngineKind::ContextAware,
            Engine::MlEnhanced(_) => EngineKind::MlEnhanced,
            Engine::BasicSimilarity(_) => EngineKind::BasicSimilarity,
        }
    }

    pub async fn score<'a, R: ContentRepository>(
        &self,
        candidates: &'a [Candidate],
        ctx: &ScoringContext<'_, R>,
    ) -> Result<Vec<ScoredCandidate<'a>>, EngineError> {
        match self {
            Engine::FastSemantic(engine) => engine.score(candidates, ctx).await,
            Engine::ContextAware(engine) => engine.score(candidates, ctx).await,
            Engine::MlEnhanced(engine) => engine.score(candidates, ctx).await,
            Engine::BasicSimilarity(engine) => Ok(engine.score(candidates, ctx.request, Some(ctx.intent))),
        }
    }
}

/// Join non-empty reason fragments, or a generic phrase if there are none.
pub(crate) fn join_reasons(parts: Vec<String>) -> String {
    if parts.is_empty() {
        "general match for your request".to_string()
    } else {
        parts.join("; ")
    }
}
