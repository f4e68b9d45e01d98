#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use curio_core::embedding::box_embedder::BoxEmbedder;
use curio_core::embedding::caching::CachingEmbedder;
use curio_core::embedding::embedder::Embedder;
use curio_core::llm::box_provider::BoxLlmProvider;
use curio_core::llm::factory::ProviderFactory;
use curio_core::llm::gateway::LlmGateway;
use curio_core::llm::provider::LlmProvider;
use curio_core::orchestrator::recommender::Recommender;
use curio_core::quota::manager::QuotaManager;
use curio_core::repository::cache::{CacheStore, pattern_matches};
use curio_core::repository::content::ContentRepository;
use curio_core::repository::counter::CounterStore;
use curio_core::repository::user_key::UserKeyStore;
use curio_types::candidate::{Candidate, ContentAnalysis};
use curio_types::config::RecommenderConfig;
use curio_types::error::{CacheError, QuotaError, RepositoryError, SecretError};
use curio_types::identity::{CandidateId, ProjectId, TaskId, UserId};
use curio_types::intent::ProjectContext;
use curio_types::interaction::Interaction;
use curio_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
use curio_types::secret::{ApiKeyEntry, Redacted, ResolvedApiKey};

pub type TestRecommender = Recommender<Catalog, MapCache, MapCounters, NoUserKeys, CountingFactory>;

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_767_225_600 + secs, 0).unwrap()
}

pub fn item(id: i64, title: &str, technologies: &[&str], quality: u8, created: i64) -> Candidate {
    Candidate {
        id: CandidateId(id),
        title: title.to_string(),
        embedding: Some(BagOfWords::vector(title)),
        quality_score: quality,
        technologies: technologies.iter().map(|t| t.to_string()).collect(),
        cached_analysis: None,
        created_at: at(created),
    }
}

#[derive(Default)]
pub struct Catalog {
    pub candidates: Vec<Candidate>,
    pub interactions: Vec<Interaction>,
    pub projects: HashMap<ProjectId, ProjectContext>,
}

impl Catalog {
    pub fn of(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }
}

impl ContentRepository for Catalog {
    async fn get_candidates(
        &self,
        _user_id: &UserId,
        _project_id: Option<ProjectId>,
        limit: Option<usize>,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        Ok(self
            .candidates
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get_cached_analysis(&self, _id: CandidateId) -> Result<Option<ContentAnalysis>, RepositoryError> {
        Ok(None)
    }

    async fn get_project_context(
        &self,
        _user_id: &UserId,
        project_id: ProjectId,
        _task_id: Option<TaskId>,
    ) -> Result<Option<ProjectContext>, RepositoryError> {
        Ok(self.projects.get(&project_id).cloned())
    }

    async fn get_interaction_history(&self, _user_id: &UserId) -> Result<Vec<Interaction>, RepositoryError> {
        Ok(self.interactions.clone())
    }
}

#[derive(Default)]
pub struct MapCache {
    entries: Mutex<HashMap<String, String>>,
}

impl CacheStore for MapCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String, _ttl: Duration) -> Result<(), CacheError> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|k, _| !pattern_matches(pattern, k));
        Ok((before - entries.len()) as u64)
    }
}

#[derive(Default)]
pub struct MapCounters {
    counts: Mutex<HashMap<String, u64>>,
}

impl CounterStore for MapCounters {
    async fn incr_with_expiry(&self, key: &str, _ttl: Duration) -> Result<u64, QuotaError> {
        let mut counts = self.counts.lock().unwrap();
        let v = counts.entry(key.to_string()).or_insert(0);
        *v += 1;
        Ok(*v)
    }

    async fn decr(&self, key: &str) -> Result<u64, QuotaError> {
        let mut counts = self.counts.lock().unwrap();
        let v = counts.entry(key.to_string()).or_insert(0);
        *v = v.saturating_sub(1);
        Ok(*v)
    }

    async fn get(&self, key: &str) -> Result<u64, QuotaError> {
        Ok(self.counts.lock().unwrap().get(key).copied().unwrap_or(0))
    }
}

/// Nobody has a personal key; every call uses the shared key.
pub struct NoUserKeys;

impl UserKeyStore for NoUserKeys {
    async fn get_user_api_key(&self, _user_id: &UserId) -> Result<Option<Redacted>, SecretError> {
        Ok(None)
    }

    async fn set_user_api_key(&self, _user_id: &UserId, _api_key: &Redacted) -> Result<(), SecretError> {
        Err(SecretError::ProviderUnavailable)
    }

    async fn delete_user_api_key(&self, _user_id: &UserId) -> Result<bool, SecretError> {
        Ok(false)
    }

    async fn get_entry(&self, _user_id: &UserId) -> Result<Option<ApiKeyEntry>, SecretError> {
        Ok(None)
    }
}

#[derive(Clone)]
pub struct CountingProvider {
    reply: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl CountingProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Never answers; every call runs into the gateway timeout.
    pub fn unresponsive() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(CompletionResponse {
                id: "r".to_string(),
                content: reply.clone(),
                model: request.model.clone(),
                usage: Usage::default(),
            }),
            None => std::future::pending().await,
        }
    }
}

pub struct CountingFactory {
    provider: CountingProvider,
}

impl ProviderFactory for CountingFactory {
    fn build(&self, _api_key: &ResolvedApiKey) -> Result<BoxLlmProvider, LlmError> {
        Ok(BoxLlmProvider::new(self.provider.clone()))
    }
}

/// Deterministic embedder: lowercase tokens hashed into 32 buckets.
#[derive(Clone, Default)]
pub struct BagOfWords {
    calls: Arc<AtomicUsize>,
}

impl BagOfWords {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; 32];
        for token in text.to_lowercase().split_whitespace() {
            let bucket = token
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3));
            v[(bucket % 32) as usize] += 1.0;
        }
        v
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for BagOfWords {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }

    fn dimension(&self) -> usize {
        32
    }
}

pub struct Harness {
    pub recommender: TestRecommender,
    pub provider: CountingProvider,
    pub embedder: Option<BagOfWords>,
}

pub fn harness(
    catalog: Catalog,
    provider: CountingProvider,
    embedder: Option<BagOfWords>,
    config: RecommenderConfig,
) -> Harness {
    let gateway = LlmGateway::new(
        NoUserKeys,
        CountingFactory {
            provider: provider.clone(),
        },
        QuotaManager::new(MapCounters::default(), config.quota.clone()),
        &config,
        Some(Redacted::new("sk-shared-test")),
    );
    let caching = embedder.clone().map(|e| {
        Arc::new(CachingEmbedder::new(
            BoxEmbedder::new(e),
            config.embedding.cache_capacity,
            Duration::from_millis(config.timeouts.embedding_ms),
        ))
    });
    let recommender = Recommender::new(catalog, MapCache::default(), Arc::new(gateway), caching, config);
    Harness {
        recommender,
        provider,
        embedder,
    }
}

pub const LEARN_REPLY: &str = r#"{"intent": "learn", "confidence": 0.92, "keywords": ["react", "hooks"]}"#;
pub const RESEARCH_REPLY: &str = r#"{"intent": "research", "confidence": 0.8, "keywords": []}"#;
