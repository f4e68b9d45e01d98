//! Configuration types for the recommender.
//!
//! `RecommenderConfig` represents the top-level `config.toml`. Every field
//! has a default, so an empty file (or no file) yields a working setup.
//! The scoring weights are empirically chosen defaults, not derived
//! constants, which is why they are configurable.

use serde::{Deserialize, Serialize};

use crate::llm::ProviderType;
use crate::quota::QuotaLimits;

/// Tolerance when checking that a weight set sums to 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub candidates: CandidateConfig,
}

impl RecommenderConfig {
    /// Replace invalid sections with their defaults.
    ///
    /// Returns the repaired config and one message per substitution so the
    /// loader can log them.
    pub fn sanitized(mut self) -> (Self, Vec<String>) {
        let mut problems = Vec::new();

        let fast_sum = self.scoring.fast.sum();
        if (fast_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE || self.scoring.fast.has_negative() {
            problems.push(format!(
                "scoring.fast weights sum to {fast_sum:.3}, expected 1.0; using defaults"
            ));
            self.scoring.fast = FastSemanticWeights::default();
        }

        let context_sum = self.scoring.context.sum();
        if (context_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE || self.scoring.context.has_negative()
        {
            problems.push(format!(
                "scoring.context weights sum to {context_sum:.3}, expected 1.0; using defaults"
            ));
            self.scoring.context = ContextWeights::default();
        }

        let p = &self.scoring.personalization;
        if !(p.min_factor > 0.0 && p.min_factor <= 1.0 && p.max_factor >= 1.0) {
            problems.push(format!(
                "scoring.personalization bounds [{}, {}] must bracket 1.0; using defaults",
                p.min_factor, p.max_factor
            ));
            self.scoring.personalization = PersonalizationBounds::default();
        }

        if !(0.0..1.0).contains(&self.scoring.score_floor) {
            problems.push(format!(
                "scoring.score_floor {} outside [0, 1); using default",
                self.scoring.score_floor
            ));
            self.scoring.score_floor = default_score_floor();
        }

        (self, problems)
    }
}

/// Scoring parameters shared by the engines and post-processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub fast: FastSemanticWeights,
    #[serde(default)]
    pub context: ContextWeights,
    #[serde(default)]
    pub personalization: PersonalizationBounds,
    /// Scores below this absolute floor are dropped.
    #[serde(default = "default_score_floor")]
    pub score_floor: f64,
    /// Shared technology tags at which the diversity penalty applies.
    #[serde(default = "default_diversity_overlap")]
    pub diversity_overlap_threshold: usize,
}

fn default_score_floor() -> f64 {
    0.15
}

fn default_diversity_overlap() -> usize {
    2
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fast: FastSemanticWeights::default(),
            context: ContextWeights::default(),
            personalization: PersonalizationBounds::default(),
            score_floor: default_score_floor(),
            diversity_overlap_threshold: default_diversity_overlap(),
        }
    }
}

/// Fast-Semantic weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastSemanticWeights {
    pub technology_overlap: f64,
    pub cosine_similarity: f64,
    pub quality: f64,
}

impl Default for FastSemanticWeights {
    fn default() -> Self {
        Self {
            technology_overlap: 0.5,
            cosine_similarity: 0.4,
            quality: 0.1,
        }
    }
}

impl FastSemanticWeights {
    pub fn sum(&self) -> f64 {
        self.technology_overlap + self.cosine_similarity + self.quality
    }

    fn has_negative(&self) -> bool {
        [self.technology_overlap, self.cosine_similarity, self.quality]
            .iter()
            .any(|w| *w < 0.0)
    }
}

/// Context-Aware (and ML-Enhanced) weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextWeights {
    pub semantic: f64,
    pub technology: f64,
    pub content_type: f64,
    pub ml_signal: f64,
    pub keyword: f64,
    pub difficulty: f64,
    pub quality: f64,
}

impl Default for ContextWeights {
    fn default() -> Self {
        Self {
            semantic: 0.55,
            technology: 0.20,
            content_type: 0.08,
            ml_signal: 0.10,
            keyword: 0.04,
            difficulty: 0.02,
            quality: 0.01,
        }
    }
}

impl ContextWeights {
    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    fn has_negative(&self) -> bool {
        self.as_array().iter().any(|w| *w < 0.0)
    }

    fn as_array(&self) -> [f64; 7] {
        [
            self.semantic,
            self.technology,
            self.content_type,
            self.ml_signal,
            self.keyword,
            self.difficulty,
            self.quality,
        ]
    }
}

/// Range of the ML-Enhanced personalization multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizationBounds {
    pub min_factor: f64,
    pub max_factor: f64,
}

impl Default for PersonalizationBounds {
    fn default() -> Self {
        Self {
            min_factor: 0.8,
            max_factor: 1.2,
        }
    }
}

/// Timeouts for every external call, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub llm_ms: u64,
    pub embedding_ms: u64,
    pub candidate_store_ms: u64,
    /// Overall deadline for one recommendation request.
    pub request_deadline_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            llm_ms: 5_000,
            embedding_ms: 2_000,
            candidate_store_ms: 3_000,
            request_deadline_ms: 10_000,
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 30 * 60,
        }
    }
}

/// Quota limits for user-owned keys and the shared fallback key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    pub user: QuotaLimits,
    /// Coarser limits applied per user when the shared key is used.
    pub shared: QuotaLimits,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            user: QuotaLimits {
                per_minute: 30,
                per_day: 1_000,
                per_month: 20_000,
            },
            shared: QuotaLimits {
                per_minute: 5,
                per_day: 50,
                per_month: 500,
            },
        }
    }
}

/// LLM provider and client pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: ProviderType,
    pub model: String,
    pub base_url: Option<String>,
    /// Environment variable holding the shared fallback key.
    pub shared_key_env: String,
    pub max_tokens: u32,
    /// Upper bound on cached per-user clients.
    pub client_pool_capacity: usize,
    /// Idle time after which a cached client is evicted.
    pub client_idle_ttl_secs: u64,
    /// Consecutive provider failures before the circuit opens.
    pub circuit_failure_threshold: u32,
    /// How long the circuit stays open before a probe is allowed.
    pub circuit_open_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderType::Anthropic,
            model: "claude-3-5-haiku-latest".to_string(),
            base_url: None,
            shared_key_env: "CURIO_SHARED_API_KEY".to_string(),
            max_tokens: 256,
            client_pool_capacity: 256,
            client_idle_ttl_secs: 15 * 60,
            circuit_failure_threshold: 3,
            circuit_open_secs: 30,
        }
    }
}

/// Embedding cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Maximum cached text embeddings per process.
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10_000,
        }
    }
}

/// Candidate retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateConfig {
    /// Upper bound on candidates fetched per request (`None` = store default).
    pub limit: Option<usize>,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self { limit: Some(500) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((FastSemanticWeights::default().sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
        assert!((ContextWeights::default().sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: RecommenderConfig = toml::from_str("").unwrap();
        assert_eq!(config, RecommenderConfig::default());
        assert_eq!(config.timeouts.llm_ms, 5_000);
        assert_eq!(config.cache.ttl_secs, 1_800);
        assert!((config.scoring.score_floor - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let toml_str = r#"
[timeouts]
request_deadline_ms = 2500

[quota.user]
per_minute = 3
per_day = 10
per_month = 100

[scoring.fast]
technology_overlap = 0.6
cosine_similarity = 0.3
"#;
        let config: RecommenderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timeouts.request_deadline_ms, 2_500);
        assert_eq!(config.timeouts.llm_ms, 5_000);
        assert_eq!(config.quota.user.per_minute, 3);
        assert_eq!(config.quota.shared.per_minute, 5);
        assert!((config.scoring.fast.technology_overlap - 0.6).abs() < f64::EPSILON);
        assert!((config.scoring.fast.quality - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sanitized_keeps_valid_config() {
        let (config, problems) = RecommenderConfig::default().sanitized();
        assert!(problems.is_empty());
        assert_eq!(config, RecommenderConfig::default());
    }

    #[test]
    fn test_sanitized_replaces_bad_weights() {
        let mut config = RecommenderConfig::default();
        config.scoring.context.semantic = 0.9;
        config.scoring.fast.quality = -0.1;
        config.scoring.fast.technology_overlap = 0.7;
        let (fixed, problems) = config.sanitized();
        assert_eq!(problems.len(), 2);
        assert_eq!(fixed.scoring.context, ContextWeights::default());
        assert_eq!(fixed.scoring.fast, FastSemanticWeights::default());
    }

    #[test]
    fn test_sanitized_rejects_inverted_personalization_bounds() {
        let mut config = RecommenderConfig::default();
        config.scoring.personalization = PersonalizationBounds {
            min_factor: 1.1,
            max_factor: 0.9,
        };
        let (fixed, problems) = config.sanitized();
        assert_eq!(problems.len(), 1);
        assert_eq!(fixed.scoring.personalization, PersonalizationBounds::default());
    }
}
