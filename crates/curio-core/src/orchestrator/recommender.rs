//! Recommender: the request pipeline.
//!
//! CacheCheck -> IntentResolve -> EngineSelect -> Score -> PostProcess ->
//! CacheStore, all under one overall deadline. Intent analysis and the
//! candidate fetch run concurrently. Engine failures walk the fallback
//! chain down to BasicSimilarity, and when the deadline expires the
//! BasicSimilarity list over whatever candidates were fetched is returned.
//! Identical concurrent requests share one computation.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use curio_types::candidate::Candidate;
use curio_types::config::RecommenderConfig;
use curio_types::error::{QuotaError, RecommendError};
use curio_types::identity::UserId;
use curio_types::intent::{Intent, ProjectContext};
use curio_types::quota::QuotaState;
use curio_types::recommendation::{EngineKind, RankedRecommendation, RecommendationOutcome};
use curio_types::request::RecommendationRequest;

use super::postprocess::post_process;
use super::selection::{fallback_chain, needs_history, select_engine};
use crate::cache::{ResultCache, cache_key};
use crate::embedding::caching::CachingEmbedder;
use crate::intent::analyzer::IntentAnalyzer;
use crate::llm::factory::ProviderFactory;
use crate::llm::gateway::LlmGateway;
use crate::repository::cache::CacheStore;
use crate::repository::content::ContentRepository;
use crate::repository::counter::CounterStore;
use crate::repository::user_key::UserKeyStore;
use crate::scoring::basic::BasicSimilarityEngine;
use crate::scoring::personalization::PersonalizationProfile;
use crate::scoring::{Engine, ScoringContext};

type InFlight = Arc<OnceCell<RecommendationOutcome>>;

/// Owns one caller's interest in an in-flight computation and clears the
/// map entry when dropped, whether the caller finished or was cancelled.
struct InFlightSlot<'a> {
    in_flight: &'a DashMap<String, InFlight>,
    key: &'a str,
    cell: InFlight,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.in_flight
            .remove_if(self.key, |_, existing| Arc::ptr_eq(existing, &self.cell));
    }
}

/// Orchestrates intent analysis, candidate retrieval, scoring and caching.
///
/// Generic over the ports so that curio-core never depends on curio-infra;
/// the api crate pins the concrete adapters.
pub struct Recommender<R, C, Q, K, F>
where
    R: ContentRepository,
    C: CacheStore,
    Q: CounterStore,
    K: UserKeyStore,
    F: ProviderFactory,
{
    repository: R,
    cache: ResultCache<C>,
    gateway: Arc<LlmGateway<Q, K, F>>,
    analyzer: IntentAnalyzer<Q, K, F>,
    embedder: Option<Arc<CachingEmbedder>>,
    config: RecommenderConfig,
    in_flight: DashMap<String, InFlight>,
}

impl<R, C, Q, K, F> Recommender<R, C, Q, K, F>
where
    R: ContentRepository,
    C: CacheStore,
    Q: CounterStore,
    K: UserKeyStore,
    F: ProviderFactory,
{
    pub fn new(
        repository: R,
        cache_store: C,
        gateway: Arc<LlmGateway<Q, K, F>>,
        embedder: Option<Arc<CachingEmbedder>>,
        config: RecommenderConfig,
    ) -> Self {
        let cache = ResultCache::new(
            cache_store,
            Duration::from_secs(config.cache.ttl_secs),
            config.cache.enabled,
        );
        Self {
            repository,
            cache,
            analyzer: IntentAnalyzer::new(Arc::clone(&gateway)),
            gateway,
            embedder,
            config,
            in_flight: DashMap::new(),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn gateway(&self) -> &Arc<LlmGateway<Q, K, F>> {
        &self.gateway
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// The result cache's backing store, for maintenance sweeps.
    pub fn cache_store(&self) -> &C {
        self.cache.store()
    }

    /// Ranked recommendations for `request`.
    ///
    /// Only an invalid request is an error; every downstream failure is
    /// absorbed into a lower-quality (possibly empty) list.
    pub async fn get_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<RankedRecommendation>, RecommendError> {
        self.recommend(request).await.map(|outcome| outcome.recommendations)
    }

    /// Like [`get_recommendations`](Self::get_recommendations), with the
    /// engine, intent and cache metadata attached.
    #[tracing::instrument(skip_all, fields(user_id = %request.user_id))]
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationOutcome, RecommendError> {
        let request = request.validate()?;
        let key = cache_key(&request);

        if let Some(mut hit) = self.cache.get(&key).await {
            hit.cache_hit = true;
            info!(engine = %hit.engine_used, results = hit.recommendations.len(), "served from cache");
            return Ok(hit);
        }

        let cell = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        // Removes the entry even when this future is dropped mid-compute.
        let _slot = InFlightSlot {
            in_flight: &self.in_flight,
            key: &key,
            cell: Arc::clone(&cell),
        };
        let outcome = cell
            .get_or_init(|| self.compute(&request, &key))
            .await
            .clone();

        info!(
            engine = %outcome.engine_used,
            results = outcome.recommendations.len(),
            degraded = outcome.degraded,
            "recommendations ready"
        );
        Ok(outcome)
    }

    /// Drop every cached list for `user_id`; called when the user's content
    /// or projects change.
    pub async fn invalidate_user_cache(&self, user_id: &UserId) -> u64 {
        self.cache.invalidate_user(user_id).await
    }

    /// Current quota usage for the key the user's next call would bill.
    pub async fn get_quota_status(&self, user_id: &UserId) -> Result<QuotaState, QuotaError> {
        self.gateway.quota_status(user_id).await
    }

    /// One cache-miss computation under the overall deadline.
    async fn compute(&self, request: &RecommendationRequest, key: &str) -> RecommendationOutcome {
        let candidates = OnceLock::new();
        let intent = OnceLock::new();
        let deadline = Duration::from_millis(self.config.timeouts.request_deadline_ms);

        match tokio::time::timeout(deadline, self.run(request, &candidates, &intent)).await {
            Ok(outcome) => {
                if !outcome.degraded {
                    self.cache.set(key, &outcome).await;
                }
                outcome
            }
            Err(_) => {
                warn!(
                    deadline_ms = deadline.as_millis() as u64,
                    "request deadline exceeded, returning basic similarity"
                );
                let fetched: &[Candidate] = candidates.get().map(Vec::as_slice).unwrap_or(&[]);
                let intent = intent.get().cloned();
                let scored = BasicSimilarityEngine.score(fetched, request, intent.as_ref());
                RecommendationOutcome {
                    recommendations: post_process(
                        scored,
                        request,
                        EngineKind::BasicSimilarity,
                        &self.config.scoring,
                    ),
                    engine_used: EngineKind::BasicSimilarity,
                    intent,
                    cache_hit: false,
                    degraded: true,
                }
            }
        }
    }

    async fn run(
        &self,
        request: &RecommendationRequest,
        candidate_slot: &OnceLock<Vec<Candidate>>,
        intent_slot: &OnceLock<Intent>,
    ) -> RecommendationOutcome {
        let resolve_intent = async {
            let project = self.load_project_context(request).await;
            let intent = self
                .analyzer
                .analyze(&request.user_id, &request.query_text, project.as_ref())
                .await;
            let _ = intent_slot.set(intent.clone());
            (project, intent)
        };
        let fetch_candidates = async {
            let (fetched, ok) = self.load_candidates(request).await;
            let _ = candidate_slot.set(fetched);
            ok
        };
        let ((project, intent), fetch_ok) = tokio::join!(resolve_intent, fetch_candidates);
        let candidates: &[Candidate] = candidate_slot.get().map(Vec::as_slice).unwrap_or(&[]);

        let profile = if needs_history(request.engine_preference, &intent) {
            self.load_profile(&request.user_id).await
        } else {
            None
        };
        let has_history = profile.as_ref().is_some_and(|p| !p.is_empty());
        let selected = select_engine(request.engine_preference, &intent, has_history);
        tracing::debug!(
            intent = %intent.intent_type,
            source = %intent.source,
            engine = %selected,
            candidates = candidates.len(),
            "engine selected"
        );

        if candidates.is_empty() {
            return RecommendationOutcome {
                recommendations: Vec::new(),
                engine_used: selected,
                intent: Some(intent),
                cache_hit: false,
                degraded: !fetch_ok,
            };
        }

        let project_text = project.as_ref().map(ProjectContext::as_text);
        let query_text = if request.query_text.is_empty() {
            project_text.as_deref().unwrap_or_default()
        } else {
            request.query_text.as_str()
        };
        let ctx = ScoringContext {
            request,
            intent: &intent,
            query_text,
            repository: &self.repository,
            embedder: self.embedder.as_deref(),
            profile: profile.as_ref(),
            analysis_timeout: Duration::from_millis(self.config.timeouts.candidate_store_ms),
        };

        for kind in fallback_chain(selected) {
            let engine = Engine::for_kind(kind, &self.config.scoring);
            match engine.score(candidates, &ctx).await {
                Ok(scored) => {
                    return RecommendationOutcome {
                        recommendations: post_process(scored, request, kind, &self.config.scoring),
                        engine_used: kind,
                        intent: Some(intent),
                        cache_hit: false,
                        degraded: kind != selected || !fetch_ok,
                    };
                }
                Err(e) => {
                    warn!(engine = %kind, error = %e, "engine failed, falling back");
                }
            }
        }

        // BasicSimilarity ends every chain and cannot fail.
        let scored = BasicSimilarityEngine.score(candidates, request, Some(&intent));
        RecommendationOutcome {
            recommendations: post_process(
                scored,
                request,
                EngineKind::BasicSimilarity,
                &self.config.scoring,
            ),
            engine_used: EngineKind::BasicSimilarity,
            intent: Some(intent),
            cache_hit: false,
            degraded: true,
        }
    }

    /// Candidates for the request, and whether the fetch succeeded.
    async fn load_candidates(&self, request: &RecommendationRequest) -> (Vec<Candidate>, bool) {
        let budget = Duration::from_millis(self.config.timeouts.candidate_store_ms);
        let fetch = self.repository.get_candidates(
            &request.user_id,
            request.project_id,
            self.config.candidates.limit,
        );
        match tokio::time::timeout(budget, fetch).await {
            Ok(Ok(candidates)) => (candidates, true),
            Ok(Err(e)) => {
                warn!(error = %e, "candidate fetch failed");
                (Vec::new(), false)
            }
            Err(_) => {
                warn!(budget_ms = budget.as_millis() as u64, "candidate fetch timed out");
                (Vec::new(), false)
            }
        }
    }

    async fn load_project_context(&self, request: &RecommendationRequest) -> Option<ProjectContext> {
        let project_id = request.project_id?;
        let budget = Duration::from_millis(self.config.timeouts.candidate_store_ms);
        let lookup = self
            .repository
            .get_project_context(&request.user_id, project_id, request.task_id);
        match tokio::time::timeout(budget, lookup).await {
            Ok(Ok(context)) => context,
            Ok(Err(e)) => {
                warn!(%project_id, error = %e, "project context lookup failed");
                None
            }
            Err(_) => {
                warn!(%project_id, "project context lookup timed out");
                None
            }
        }
    }

    /// Interaction history folded into a profile; `None` when unavailable.
    async fn load_profile(&self, user_id: &UserId) -> Option<PersonalizationProfile> {
        let budget = Duration::from_millis(self.config.timeouts.candidate_store_ms);
        match tokio::time::timeout(budget, self.repository.get_interaction_history(user_id)).await {
            Ok(Ok(history)) => Some(PersonalizationProfile::from_interactions(&history)),
            Ok(Err(e)) => {
                warn!(error = %e, "interaction history unavailable");
                None
            }
            Err(_) => {
                warn!("interaction history lookup timed out");
                None
            }
        }
    }
}
