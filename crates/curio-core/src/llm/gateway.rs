//! LlmGateway: the single path for outbound LLM calls.
//!
//! Per call: circuit check, key resolution (user key, else the shared
//! fallback key), quota reservation against that key's quota, client lookup
//! in the per-user pool, then the completion. The LLM timeout bounds the
//! whole sequence, so a stalled key or counter store can't hold a call open.

use std::time::Duration;

use curio_types::config::RecommenderConfig;
use curio_types::error::{QuotaError, SecretError};
use curio_types::identity::UserId;
use curio_types::llm::{CompletionRequest, LlmError, Message};
use curio_types::quota::{KeySource, QuotaState};
use curio_types::secret::{ApiKeyEntry, Redacted, ResolvedApiKey};

use super::breaker::CircuitBreaker;
use super::client_pool::ClientPool;
use super::factory::ProviderFactory;
use crate::quota::manager::QuotaManager;
use crate::repository::counter::CounterStore;
use crate::repository::user_key::UserKeyStore;

pub struct LlmGateway<Q: CounterStore, K: UserKeyStore, F: ProviderFactory> {
    keys: K,
    factory: F,
    quota: QuotaManager<Q>,
    pool: ClientPool,
    breaker: CircuitBreaker,
    shared_key: Option<Redacted>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl<Q: CounterStore, K: UserKeyStore, F: ProviderFactory> LlmGateway<Q, K, F> {
    pub fn new(
        keys: K,
        factory: F,
        quota: QuotaManager<Q>,
        config: &RecommenderConfig,
        shared_key: Option<Redacted>,
    ) -> Self {
        let llm = &config.llm;
        Self {
            keys,
            factory,
            quota,
            pool: ClientPool::new(
                llm.client_pool_capacity,
                Duration::from_secs(llm.client_idle_ttl_secs),
            ),
            breaker: CircuitBreaker::new(
                llm.circuit_failure_threshold,
                Duration::from_secs(llm.circuit_open_secs),
            ),
            shared_key: shared_key.filter(|k| !k.expose().trim().is_empty()),
            model: llm.model.clone(),
            max_tokens: llm.max_tokens,
            timeout: Duration::from_millis(config.timeouts.llm_ms),
        }
    }

    /// The key a call for `user_id` would use.
    ///
    /// A key-store failure is treated like "no user key" so the shared key
    /// can still serve the request.
    async fn resolve_key(&self, user_id: &UserId) -> Option<ResolvedApiKey> {
        match self.keys.get_user_api_key(user_id).await {
            Ok(Some(key)) => {
                return Some(ResolvedApiKey {
                    key,
                    source: KeySource::User,
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "user key lookup failed, trying shared key");
            }
        }
        self.shared_key.clone().map(|key| ResolvedApiKey {
            key,
            source: KeySource::SharedFallback,
        })
    }

    /// Which quota a call for `user_id` is billed against.
    pub async fn key_source(&self, user_id: &UserId) -> KeySource {
        match self.keys.get_user_api_key(user_id).await {
            Ok(Some(_)) => KeySource::User,
            _ => KeySource::SharedFallback,
        }
    }

    /// Send one prompt and return the completion text.
    #[tracing::instrument(
        name = "gen_ai.complete",
        skip_all,
        fields(user_id = %user_id, gen_ai.operation.name = "chat", gen_ai.request.model = %self.model)
    )]
    pub async fn complete(
        &self,
        user_id: &UserId,
        system: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        if !self.breaker.allow_request() {
            return Err(LlmError::CircuitOpen);
        }

        let bounded = tokio::time::timeout(self.timeout, self.complete_inner(user_id, system, prompt));
        let result = match bounded.await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };
        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(e) => {
                if matches!(e, LlmError::AuthenticationFailed) {
                    self.pool.remove(user_id);
                }
                self.breaker.record_failure(e);
            }
        }
        result
    }

    async fn complete_inner(
        &self,
        user_id: &UserId,
        system: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let api_key = self.resolve_key(user_id).await.ok_or(LlmError::NoApiKey)?;

        let decision = match self.quota.check_and_reserve(user_id, api_key.source).await {
            Ok(decision) => decision,
            Err(e) => {
                // Deny without consuming; the caller falls back locally.
                tracing::warn!(error = %e, "quota store unavailable, skipping LLM call");
                return Err(LlmError::QuotaExceeded {
                    retry_after_seconds: 0,
                });
            }
        };
        if !decision.allowed {
            return Err(LlmError::QuotaExceeded {
                retry_after_seconds: decision.retry_after_seconds,
            });
        }

        let client = self
            .pool
            .get_or_build(user_id, api_key.source, || self.factory.build(&api_key))?;

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            system: Some(system.to_string()),
            max_tokens: self.max_tokens,
            temperature: Some(0.0),
        };

        let response = client.complete(&request).await?;
        tracing::debug!(
            provider = client.name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM call completed"
        );
        Ok(response.content)
    }

    /// Quota usage for the key the user's calls are billed against.
    pub async fn quota_status(&self, user_id: &UserId) -> Result<QuotaState, QuotaError> {
        let source = self.key_source(user_id).await;
        self.quota.status(user_id, source).await
    }

    /// Store a user's own key and drop any client built with the old one.
    pub async fn set_user_key(&self, user_id: &UserId, api_key: &Redacted) -> Result<(), SecretError> {
        self.keys.set_user_api_key(user_id, api_key).await?;
        self.pool.remove(user_id);
        Ok(())
    }

    pub async fn delete_user_key(&self, user_id: &UserId) -> Result<bool, SecretError> {
        let existed = self.keys.delete_user_api_key(user_id).await?;
        self.pool.remove(user_id);
        Ok(existed)
    }

    pub async fn user_key_entry(&self, user_id: &UserId) -> Result<Option<ApiKeyEntry>, SecretError> {
        self.keys.get_entry(user_id).await
    }

    pub fn has_shared_key(&self) -> bool {
        self.shared_key.is_some()
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn pool(&self) -> &ClientPool {
        &self.pool
    }
}
