//! Result cache keyed by user and a digest of the request.
//!
//! Keys have the shape `recommendations:{user_id}:{digest}` so that all of
//! a user's entries can be dropped with one `recommendations:{user_id}:*`
//! pattern. Every store failure is logged and treated as a miss.

use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};

use curio_types::identity::{ProjectId, TaskId, UserId};
use curio_types::recommendation::RecommendationOutcome;
use curio_types::request::{EnginePreference, RecommendationRequest};

use crate::repository::cache::CacheStore;

pub const KEY_PREFIX: &str = "recommendations";

/// Hex characters of the SHA-256 digest kept in the key.
const DIGEST_LEN: usize = 32;

/// Canonical, order-independent view of the request fields that affect
/// the result list.
#[derive(Serialize)]
struct KeyMaterial<'a> {
    query: String,
    project_id: Option<ProjectId>,
    task_id: Option<TaskId>,
    technologies: Vec<&'a str>,
    engine: EnginePreference,
    max_results: usize,
    diversity_weight: String,
    quality_threshold: u8,
}

/// Build the cache key for an already-validated request.
pub fn cache_key(request: &RecommendationRequest) -> String {
    let mut technologies: Vec<&str> = request.technology_profile.iter().map(String::as_str).collect();
    technologies.sort_unstable();
    technologies.dedup();

    let material = KeyMaterial {
        query: request.normalized_query(),
        project_id: request.project_id,
        task_id: request.task_id,
        technologies,
        engine: request.engine_preference,
        max_results: request.max_results,
        diversity_weight: format!("{:.4}", request.diversity_weight),
        quality_threshold: request.quality_threshold,
    };
    // Serializing a struct of plain fields cannot fail.
    let canonical = serde_json::to_string(&material).unwrap_or_default();

    let digest = Sha256::digest(canonical.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{KEY_PREFIX}:{}:{}", request.user_id, &hex[..DIGEST_LEN])
}

/// Pattern matching every cached entry of `user_id`.
pub fn user_pattern(user_id: &UserId) -> String {
    format!("{KEY_PREFIX}:{user_id}:*")
}

pub struct ResultCache<C: CacheStore> {
    store: C,
    ttl: Duration,
    enabled: bool,
}

impl<C: CacheStore> ResultCache<C> {
    pub fn new(store: C, ttl: Duration, enabled: bool) -> Self {
        Self { store, ttl, enabled }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    pub async fn get(&self, key: &str) -> Option<RecommendationOutcome> {
        if !self.enabled {
            return None;
        }
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "result cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_str::<RecommendationOutcome>(&raw) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store `outcome` under `key`. Failures are logged and swallowed.
    pub async fn set(&self, key: &str, outcome: &RecommendationOutcome) {
        if !self.enabled {
            return;
        }
        let raw = match serde_json::to_string(outcome) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize outcome for cache");
                return;
            }
        };
        if let Err(e) = self.store.set(key, raw, self.ttl).await {
            tracing::warn!(error = %e, "result cache write failed");
        }
    }

    /// Drop every cached list for `user_id`. Returns the number removed
    /// (0 when the store is unreachable).
    pub async fn invalidate_user(&self, user_id: &UserId) -> u64 {
        if let Err(e) = user_id.check() {
            tracing::warn!(error = %e, "refusing to invalidate with an unsafe user id");
            return 0;
        }
        match self.store.invalidate_pattern(&user_pattern(user_id)).await {
            Ok(removed) => {
                tracing::debug!(%user_id, removed, "invalidated cached recommendations");
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, %user_id, "result cache invalidation failed");
                0
            }
        }
    }
}
