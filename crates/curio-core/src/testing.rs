//! In-crate fakes for the ports, shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use curio_types::candidate::{Candidate, ContentAnalysis};
use curio_types::error::{CacheError, QuotaError, RepositoryError, SecretError};
use curio_types::identity::{CandidateId, ProjectId, TaskId, UserId};
use curio_types::intent::ProjectContext;
use curio_types::interaction::Interaction;
use curio_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};
use curio_types::quota::KeySource;
use curio_types::secret::{ApiKeyEntry, Redacted, ResolvedApiKey};

use crate::embedding::embedder::Embedder;
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::factory::ProviderFactory;
use crate::llm::provider::LlmProvider;
use crate::repository::cache::{CacheStore, pattern_matches};
use crate::repository::content::ContentRepository;
use crate::repository::counter::CounterStore;
use crate::repository::user_key::UserKeyStore;

pub const FAKE_DIMENSION: usize = 16;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_767_225_600 + secs, 0).unwrap()
}

// ---- counters ----

#[derive(Default)]
pub struct MemoryCounterStore {
    counts: Mutex<HashMap<String, u64>>,
}

impl CounterStore for MemoryCounterStore {
    async fn incr_with_expiry(&self, key: &str, _ttl: Duration) -> Result<u64, QuotaError> {
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry(key.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn decr(&self, key: &str) -> Result<u64, QuotaError> {
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_sub(1);
        Ok(*entry)
    }

    async fn get(&self, key: &str) -> Result<u64, QuotaError> {
        Ok(self.counts.lock().unwrap().get(key).copied().unwrap_or(0))
    }
}

pub struct FailingCounterStore;

impl CounterStore for FailingCounterStore {
    async fn incr_with_expiry(&self, _key: &str, _ttl: Duration) -> Result<u64, QuotaError> {
        Err(QuotaError::StoreUnavailable("down".to_string()))
    }

    async fn decr(&self, _key: &str) -> Result<u64, QuotaError> {
        Err(QuotaError::StoreUnavailable("down".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<u64, QuotaError> {
        Err(QuotaError::StoreUnavailable("down".to_string()))
    }
}

// ---- keys ----

#[derive(Default)]
pub struct MemoryKeyStore {
    keys: Mutex<HashMap<UserId, String>>,
}

impl MemoryKeyStore {
    pub fn with_key(user: &str, key: &str) -> Self {
        let store = Self::default();
        store
            .keys
            .lock()
            .unwrap()
            .insert(UserId::from(user), key.to_string());
        store
    }
}

impl UserKeyStore for MemoryKeyStore {
    async fn get_user_api_key(&self, user_id: &UserId) -> Result<Option<Redacted>, SecretError> {
        Ok(self.keys.lock().unwrap().get(user_id).map(Redacted::new))
    }

    async fn set_user_api_key(&self, user_id: &UserId, api_key: &Redacted) -> Result<(), SecretError> {
        self.keys
            .lock()
            .unwrap()
            .insert(user_id.clone(), api_key.expose().to_string());
        Ok(())
    }

    async fn delete_user_api_key(&self, user_id: &UserId) -> Result<bool, SecretError> {
        Ok(self.keys.lock().unwrap().remove(user_id).is_some())
    }

    async fn get_entry(&self, user_id: &UserId) -> Result<Option<ApiKeyEntry>, SecretError> {
        Ok(self.keys.lock().unwrap().get(user_id).map(|k| ApiKeyEntry {
            user_id: user_id.clone(),
            masked: Redacted::new(k.clone()).masked(),
            created_at: ts(0),
            updated_at: ts(0),
        }))
    }
}

// ---- llm ----

#[derive(Debug)]
enum Behavior {
    Reply(String),
    Hang,
    Fail(LlmError),
}

#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    behavior: Arc<Behavior>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior: Arc::new(behavior),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with(Behavior::Reply(text.to_string()))
    }

    pub fn hanging() -> Self {
        Self::with(Behavior::Hang)
    }

    pub fn failing(error: LlmError) -> Self {
        Self::with(Behavior::Fail(error))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior.as_ref() {
            Behavior::Reply(text) => Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content: text.clone(),
                model: request.model.clone(),
                usage: Usage::default(),
            }),
            Behavior::Hang => std::future::pending().await,
            Behavior::Fail(e) => Err(e.clone()),
        }
    }
}

#[derive(Clone)]
pub struct ScriptedFactory {
    provider: ScriptedProvider,
    builds: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<(KeySource, String)>>>,
}

impl ScriptedFactory {
    pub fn new(provider: ScriptedProvider) -> Self {
        Self {
            provider,
            builds: Arc::new(AtomicUsize::new(0)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn last_source(&self) -> Option<KeySource> {
        self.last.lock().unwrap().as_ref().map(|(s, _)| *s)
    }

    pub fn last_key(&self) -> Option<String> {
        self.last.lock().unwrap().as_ref().map(|(_, k)| k.clone())
    }

    pub fn provider(&self) -> &ScriptedProvider {
        &self.provider
    }
}

impl ProviderFactory for ScriptedFactory {
    fn build(&self, api_key: &ResolvedApiKey) -> Result<BoxLlmProvider, LlmError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((api_key.source, api_key.key.expose().to_string()));
        Ok(BoxLlmProvider::new(self.provider.clone()))
    }
}

// ---- embeddings ----

#[derive(Debug, Clone, Copy, PartialEq)]
enum EmbedMode {
    Working,
    Failing,
    Hanging,
}

/// Deterministic bag-of-words embedder: each token bumps one of
/// [`FAKE_DIMENSION`] buckets chosen by FNV-1a hash.
#[derive(Debug, Clone)]
pub struct FakeEmbedder {
    mode: EmbedMode,
    calls: Arc<AtomicUsize>,
}

impl FakeEmbedder {
    fn with(mode: EmbedMode) -> Self {
        Self {
            mode,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn new() -> Self {
        Self::with(EmbedMode::Working)
    }

    pub fn failing() -> Self {
        Self::with(EmbedMode::Failing)
    }

    pub fn hanging() -> Self {
        Self::with(EmbedMode::Hanging)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; FAKE_DIMENSION];
        for token in text.to_lowercase().split_whitespace() {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for b in token.bytes() {
                hash ^= u64::from(b);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            v[(hash % FAKE_DIMENSION as u64) as usize] += 1.0;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            EmbedMode::Working => Ok(texts.iter().map(|t| Self::vector_for(t)).collect()),
            EmbedMode::Failing => Err(RepositoryError::Connection),
            EmbedMode::Hanging => std::future::pending().await,
        }
    }

    fn model_name(&self) -> &str {
        "fake-bow"
    }

    fn dimension(&self) -> usize {
        FAKE_DIMENSION
    }
}

// ---- cache ----

#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl CacheStore for MemoryCacheStore {
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

pub struct FailingCacheStore;

impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("down".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("down".to_string()))
    }

    async fn invalidate_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        Err(CacheError::Unavailable("down".to_string()))
    }
}

// ---- content ----

#[derive(Default)]
pub struct MemoryContentRepository {
    pub candidates: Vec<Candidate>,
    pub analyses: HashMap<CandidateId, ContentAnalysis>,
    pub projects: HashMap<ProjectId, ProjectContext>,
    pub interactions: Vec<Interaction>,
    pub fail_analysis: bool,
    pub analysis_lookups: AtomicUsize,
}

impl MemoryContentRepository {
    pub fn with_candidates(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }
}

impl ContentRepository for MemoryContentRepository {
    async fn get_candidates(
        &self,
        _user_id: &UserId,
        _project_id: Option<ProjectId>,
        limit: Option<usize>,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        let limit = limit.unwrap_or(usize::MAX);
        Ok(self.candidates.iter().take(limit).cloned().collect())
    }

    async fn get_cached_analysis(
        &self,
        content_id: CandidateId,
    ) -> Result<Option<ContentAnalysis>, RepositoryError> {
        self.analysis_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_analysis {
            return Err(RepositoryError::Connection);
        }
        Ok(self.analyses.get(&content_id).cloned())
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

/// A candidate whose embedding is the fake embedding of its title.
pub fn candidate(id: i64, title: &str, technologies: &[&str], quality: u8, created: i64) -> Candidate {
    Candidate {
        id: CandidateId(id),
        title: title.to_string(),
        embedding: Some(FakeEmbedder::vector_for(title)),
        quality_score: quality,
        technologies: technologies.iter().map(|t| t.to_string()).collect(),
        cached_analysis: None,
        created_at: ts(created),
    }
}
