//! Context-Aware engine: semantic similarity enriched with cached content
//! analysis, intent and inferred skill level.
//!
//! Candidates without analysis still participate; the content-type and
//! difficulty components simply contribute 0. When the embedding provider
//! is down the semantic component falls back to lexical keyword coverage.

use std::collections::{BTreeSet, HashMap};

use futures_util::future::join_all;

use curio_types::candidate::{
    Candidate, ContentAnalysis, ContentType, DifficultyLevel, normalize_technology,
};
use curio_types::config::ContextWeights;
use curio_types::error::EngineError;
use curio_types::identity::CandidateId;
use curio_types::intent::IntentType;

use super::similarity::{cosine, jaccard, keyword_coverage, tokens};
use super::skill::{difficulty_alignment, infer_skill_level};
use super::{ScoredCandidate, ScoringContext, join_reasons};
use crate::repository::content::ContentRepository;

/// Content types that suit each intent.
pub fn preferred_content_types(intent: IntentType) -> &'static [ContentType] {
    match intent {
        IntentType::Learn => &[
            ContentType::Tutorial,
            ContentType::Article,
            ContentType::Documentation,
            ContentType::Course,
            ContentType::Video,
        ],
        IntentType::Build => &[
            ContentType::Repository,
            ContentType::Library,
            ContentType::Tool,
            ContentType::Example,
        ],
        IntentType::Research => &[
            ContentType::Article,
            ContentType::Paper,
            ContentType::Discussion,
            ContentType::Documentation,
        ],
        IntentType::Unknown => &[],
    }
}

/// Per-candidate signal values, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContextSignals {
    pub semantic: f64,
    pub technology: f64,
    pub content_type: f64,
    pub ml_signal: f64,
    pub keyword: f64,
    pub difficulty: f64,
    pub quality: f64,
}

impl ContextSignals {
    pub fn combine(&self, w: &ContextWeights) -> f64 {
        w.semantic * self.semantic
            + w.technology * self.technology
            + w.content_type * self.content_type
            + w.ml_signal * self.ml_signal
            + w.keyword * self.keyword
            + w.difficulty * self.difficulty
            + w.quality * self.quality
    }
}

#[derive(Debug, Clone)]
pub struct ContextAwareEngine {
    weights: ContextWeights,
}

impl ContextAwareEngine {
    pub fn new(weights: ContextWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ContextWeights {
        &self.weights
    }

    pub async fn score<'a, R: ContentRepository>(
        &self,
        candidates: &'a [Candidate],
        ctx: &ScoringContext<'_, R>,
    ) -> Result<Vec<ScoredCandidate<'a>>, EngineError> {
        let hydrated = hydrate_analyses(candidates, ctx).await?;

        let query_vec = match ctx.query_embedding().await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(error = %e, "semantic signal degraded to keyword coverage");
                None
            }
        };
        let user_terms = ctx.user_terms();
        let interest_vec = match (&query_vec, ctx.embedder) {
            (Some(_), Some(embedder)) if !user_terms.is_empty() => {
                let text = user_terms.iter().cloned().collect::<Vec<_>>().join(" ");
                embedder.embed_one(&text).await.ok()
            }
            _ => None,
        };

        let lexical_terms: Vec<String> = if ctx.intent.keywords.is_empty() {
            tokens(ctx.query_text).into_iter().collect()
        } else {
            ctx.intent.keywords.clone()
        };
        let preferred = preferred_content_types(ctx.intent.intent_type);
        let skill = infer_skill_level(&ctx.request.query_text, ctx.intent.intent_type);

        let inputs = SignalInputs {
            query_vec: query_vec.as_deref().map(Vec::as_slice),
            interest_vec: interest_vec.as_deref().map(Vec::as_slice),
            user_terms: &user_terms,
            lexical_terms: &lexical_terms,
            preferred,
            skill,
        };

        let scored = candidates
            .iter()
            .map(|candidate| {
                let analysis = candidate
                    .cached_analysis
                    .as_ref()
                    .or_else(|| hydrated.get(&candidate.id));
                let signals = inputs.signals(candidate, analysis);
                let score = signals.combine(&self.weights).clamp(0.0, 1.0);
                ScoredCandidate {
                    candidate,
                    score,
                    reason: describe(&signals, analysis, ctx.intent.intent_type),
                }
            })
            .collect();
        Ok(scored)
    }
}

struct SignalInputs<'s> {
    query_vec: Option<&'s [f32]>,
    interest_vec: Option<&'s [f32]>,
    user_terms: &'s BTreeSet<String>,
    lexical_terms: &'s [String],
    preferred: &'static [ContentType],
    skill: DifficultyLevel,
}

impl SignalInputs<'_> {
    fn signals(&self, candidate: &Candidate, analysis: Option<&ContentAnalysis>) -> ContextSignals {
        let mut signal_terms = candidate.technologies.clone();
        let mut haystack = tokens(&candidate.title);
        haystack.extend(candidate.technologies.iter().cloned());
        if let Some(a) = analysis {
            for concept in &a.key_concepts {
                let term = normalize_technology(concept);
                if !term.is_empty() {
                    signal_terms.insert(term);
                }
                haystack.extend(tokens(concept));
            }
        }

        let embedding = candidate.embedding.as_deref().filter(|e| !e.is_empty());
        let lexical = keyword_coverage(self.lexical_terms, &haystack);
        let semantic = match (self.query_vec, embedding) {
            (Some(q), Some(e)) => cosine(q, e),
            _ => lexical,
        };
        let ml_signal = match (self.interest_vec, embedding) {
            (Some(i), Some(e)) => cosine(i, e),
            _ => 0.0,
        };

        ContextSignals {
            semantic,
            technology: jaccard(self.user_terms, &signal_terms),
            content_type: analysis
                .map(|a| f64::from(u8::from(self.preferred.contains(&a.content_type))))
                .unwrap_or(0.0),
            ml_signal,
            keyword: lexical,
            difficulty: analysis
                .and_then(|a| a.difficulty_level)
                .map(|d| difficulty_alignment(d, self.skill))
                .unwrap_or(0.0),
            quality: candidate.quality_ratio(),
        }
    }
}

/// Fetch analyses for candidates that arrived without one.
///
/// Any store failure (or exceeding the budget) fails the engine so the
/// orchestrator can fall back.
async fn hydrate_analyses<R: ContentRepository>(
    candidates: &[Candidate],
    ctx: &ScoringContext<'_, R>,
) -> Result<HashMap<CandidateId, ContentAnalysis>, EngineError> {
    let missing: Vec<CandidateId> = candidates
        .iter()
        .filter(|c| c.cached_analysis.is_none())
        .map(|c| c.id)
        .collect();
    if missing.is_empty() {
        return Ok(HashMap::new());
    }

    let lookups = join_all(missing.iter().map(|id| ctx.repository.get_cached_analysis(*id)));
    let results = tokio::time::timeout(ctx.analysis_timeout, lookups)
        .await
        .map_err(|_| {
            EngineError::AnalysisStoreUnavailable(format!(
                "analysis lookup exceeded {}ms",
                ctx.analysis_timeout.as_millis()
            ))
        })?;

    let mut hydrated = HashMap::new();
    for (id, result) in missing.into_iter().zip(results) {
        match result {
            Ok(Some(analysis)) => {
                hydrated.insert(id, analysis);
            }
            Ok(None) => {}
            Err(e) => return Err(EngineError::AnalysisStoreUnavailable(e.to_string())),
        }
    }
    Ok(hydrated)
}

fn describe(signals: &ContextSignals, analysis: Option<&ContentAnalysis>, intent: IntentType) -> String {
    let mut parts = Vec::new();
    if signals.semantic >= 0.5 {
        parts.push("close semantic match".to_string());
    }
    if signals.technology > 0.0 {
        parts.push("matches your stack".to_string());
    }
    if signals.content_type > 0.0 {
        if let Some(a) = analysis {
            parts.push(format!("{} suits a {intent} request", a.content_type));
        }
    }
    if signals.difficulty >= 1.0 {
        if let Some(level) = analysis.and_then(|a| a.difficulty_level) {
            parts.push(format!("{level} level fits you"));
        }
    }
    join_reasons(parts)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use curio_types::intent::{Intent, IntentSource};
    use curio_types::request::RecommendationRequest;

    use super::*;
    use crate::embedding::box_embedder::BoxEmbedder;
    use crate::embedding::caching::CachingEmbedder;
    use crate::testing::{FakeEmbedder, MemoryContentRepository, candidate};

    fn learn_intent(keywords: &[&str]) -> Intent {
        Intent {
            intent_type: IntentType::Learn,
            confidence: 0.9,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            source: IntentSource::Llm,
        }
    }

    fn embedder(fake: FakeEmbedder) -> CachingEmbedder {
        CachingEmbedder::new(BoxEmbedder::new(fake), 64, Duration::from_millis(200))
    }

    fn tutorial(level: DifficultyLevel) -> ContentAnalysis {
        ContentAnalysis {
            content_type: ContentType::Tutorial,
            difficulty_level: Some(level),
            key_concepts: vec!["state management".to_string()],
        }
    }

    #[test]
    fn test_signals_combine_with_default_weights() {
        let signals = ContextSignals {
            semantic: 1.0,
            technology: 1.0,
            content_type: 1.0,
            ml_signal: 1.0,
            keyword: 1.0,
            difficulty: 1.0,
            quality: 1.0,
        };
        assert!((signals.combine(&ContextWeights::default()) - 1.0).abs() < 1e-9);
        assert_eq!(ContextSignals::default().combine(&ContextWeights::default()), 0.0);
    }

    #[tokio::test]
    async fn test_analysis_raises_score_and_missing_analysis_still_participates() {
        let repo = MemoryContentRepository::default();
        let embedder = embedder(FakeEmbedder::new());
        let request = RecommendationRequest::new("u", "learn react hooks").with_technologies(["react"]);
        let intent = learn_intent(&["react", "hooks"]);
        let ctx = ScoringContext {
            request: &request,
            intent: &intent,
            query_text: "learn react hooks",
            repository: &repo,
            embedder: Some(&embedder),
            profile: None,
            analysis_timeout: Duration::from_secs(1),
        };

        let mut analysed = candidate(1, "react hooks tutorial", &["react", "hooks"], 8, 0);
        analysed.cached_analysis = Some(tutorial(DifficultyLevel::Beginner));
        let bare = candidate(2, "react hooks tutorial", &["react", "hooks"], 8, 0);
        let candidates = vec![analysed, bare];

        let scored = ContextAwareEngine::new(ContextWeights::default())
            .score(&candidates, &ctx)
            .await
            .unwrap();

        assert_eq!(scored.len(), 2);
        assert!(scored[0].score > scored[1].score);
        assert!(scored[1].score > 0.0);
        assert!(scored[0].reason.contains("tutorial suits a learn request"));
    }

    #[tokio::test]
    async fn test_missing_analyses_are_hydrated_from_store() {
        let mut repo = MemoryContentRepository::default();
        repo.analyses.insert(
            CandidateId(2),
            ContentAnalysis {
                content_type: ContentType::Tutorial,
                difficulty_level: Some(DifficultyLevel::Beginner),
                key_concepts: vec!["React".to_string()],
            },
        );
        let request = RecommendationRequest::new("u", "learn react");
        let intent = learn_intent(&["react"]);
        let ctx = ScoringContext {
            request: &request,
            intent: &intent,
            query_text: "learn react",
            repository: &repo,
            embedder: None,
            profile: None,
            analysis_timeout: Duration::from_secs(1),
        };

        let candidates = vec![
            candidate(1, "react intro", &["react"], 8, 0),
            candidate(2, "react intro", &["react"], 8, 0),
        ];
        let scored = ContextAwareEngine::new(ContextWeights::default())
            .score(&candidates, &ctx)
            .await
            .unwrap();

        assert_eq!(repo.analysis_lookups.load(Ordering::SeqCst), 2);
        assert!(scored[1].score > scored[0].score);
    }

    #[tokio::test]
    async fn test_analysis_store_failure_raises() {
        let repo = MemoryContentRepository {
            fail_analysis: true,
            ..MemoryContentRepository::default()
        };
        let request = RecommendationRequest::new("u", "react");
        let intent = learn_intent(&["react"]);
        let ctx = ScoringContext {
            request: &request,
            intent: &intent,
            query_text: "react",
            repository: &repo,
            embedder: None,
            profile: None,
            analysis_timeout: Duration::from_secs(1),
        };
        let candidates = vec![candidate(1, "react", &["react"], 8, 0)];
        let err = ContextAwareEngine::new(ContextWeights::default())
            .score(&candidates, &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::AnalysisStoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_embedder_down_uses_keyword_coverage() {
        let repo = MemoryContentRepository::default();
        let embedder = embedder(FakeEmbedder::failing());
        let request = RecommendationRequest::new("u", "react hooks");
        let intent = learn_intent(&["react", "hooks"]);
        let ctx = ScoringContext {
            request: &request,
            intent: &intent,
            query_text: "react hooks",
            repository: &repo,
            embedder: Some(&embedder),
            profile: None,
            analysis_timeout: Duration::from_secs(1),
        };
        let mut no_embedding = candidate(2, "unrelated", &[], 8, 0);
        no_embedding.embedding = None;
        let candidates = vec![candidate(1, "react hooks in depth", &["react"], 8, 0), no_embedding];

        let scored = ContextAwareEngine::new(ContextWeights::default())
            .score(&candidates, &ctx)
            .await
            .unwrap();
        assert_eq!(scored.len(), 2);
        assert!(scored[0].score > 0.55);
        assert!(scored[1].score < 0.1);
    }
}
