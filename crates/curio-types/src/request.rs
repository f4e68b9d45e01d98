//! The recommendation request value object and its validation rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::candidate::normalize_technology;
use crate::error::RecommendError;
use crate::identity::{ProjectId, TaskId, UserId};

/// Results returned when the caller does not ask for a specific count.
pub const DEFAULT_MAX_RESULTS: usize = 10;
/// Results are never returned beyond this count, whatever the caller asks for.
pub const MAX_RESULTS_CAP: usize = 50;
pub const DEFAULT_DIVERSITY_WEIGHT: f64 = 0.3;
pub const DEFAULT_QUALITY_THRESHOLD: u8 = 6;
/// Highest accepted `quality_threshold`.
pub const MAX_QUALITY_THRESHOLD: u8 = 10;

/// Which scoring engine the caller wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePreference {
    Fast,
    Context,
    Ml,
    #[default]
    Auto,
}

impl fmt::Display for EnginePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePreference::Fast => write!(f, "fast"),
            EnginePreference::Context => write!(f, "context"),
            EnginePreference::Ml => write!(f, "ml"),
            EnginePreference::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for EnginePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(EnginePreference::Fast),
            "context" => Ok(EnginePreference::Context),
            "ml" => Ok(EnginePreference::Ml),
            "auto" => Ok(EnginePreference::Auto),
            other => Err(format!("invalid engine preference: '{other}'")),
        }
    }
}

/// Input to `get_recommendations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: UserId,
    /// Free text; may be empty when `project_id` is given.
    #[serde(default)]
    pub query_text: String,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// The user's stated stack, ordered, without duplicates once normalized.
    #[serde(default)]
    pub technology_profile: Vec<String>,
    #[serde(default)]
    pub engine_preference: EnginePreference,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_diversity_weight")]
    pub diversity_weight: f64,
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: u8,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_diversity_weight() -> f64 {
    DEFAULT_DIVERSITY_WEIGHT
}

fn default_quality_threshold() -> u8 {
    DEFAULT_QUALITY_THRESHOLD
}

impl RecommendationRequest {
    /// A request with every optional field at its default.
    pub fn new(user_id: impl Into<UserId>, query_text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            query_text: query_text.into(),
            project_id: None,
            task_id: None,
            technology_profile: Vec::new(),
            engine_preference: EnginePreference::Auto,
            max_results: DEFAULT_MAX_RESULTS,
            diversity_weight: DEFAULT_DIVERSITY_WEIGHT,
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_technologies<I, S>(mut self, technologies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.technology_profile = technologies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_engine(mut self, preference: EnginePreference) -> Self {
        self.engine_preference = preference;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Check the request invariants and return a normalized copy.
    ///
    /// Normalization trims the query, lowercases and de-duplicates the
    /// technology profile (keeping first-seen order), and clamps
    /// `max_results` to [`MAX_RESULTS_CAP`].
    pub fn validate(&self) -> Result<RecommendationRequest, RecommendError> {
        self.user_id.check().map_err(RecommendError::InvalidRequest)?;

        let query_text = self.query_text.trim().to_string();
        if query_text.is_empty() && self.project_id.is_none() {
            return Err(RecommendError::InvalidRequest(
                "either query_text or project_id must be provided".to_string(),
            ));
        }

        if self.max_results == 0 {
            return Err(RecommendError::InvalidRequest(
                "max_results must be positive".to_string(),
            ));
        }

        if !self.diversity_weight.is_finite() || !(0.0..=1.0).contains(&self.diversity_weight) {
            return Err(RecommendError::InvalidRequest(format!(
                "diversity_weight must be within [0, 1], got {}",
                self.diversity_weight
            )));
        }

        if self.quality_threshold > MAX_QUALITY_THRESHOLD {
            return Err(RecommendError::InvalidRequest(format!(
                "quality_threshold must be within [0, {MAX_QUALITY_THRESHOLD}], got {}",
                self.quality_threshold
            )));
        }

        let mut technology_profile: Vec<String> = Vec::with_capacity(self.technology_profile.len());
        for tech in &self.technology_profile {
            let normalized = normalize_technology(tech);
            if !normalized.is_empty() && !technology_profile.contains(&normalized) {
                technology_profile.push(normalized);
            }
        }

        Ok(RecommendationRequest {
            user_id: UserId::new(self.user_id.as_str().trim()),
            query_text,
            project_id: self.project_id,
            task_id: self.task_id,
            technology_profile,
            engine_preference: self.engine_preference,
            max_results: self.max_results.min(MAX_RESULTS_CAP),
            diversity_weight: self.diversity_weight,
            quality_threshold: self.quality_threshold,
        })
    }

    /// Query text lowercased with whitespace collapsed (cache key component).
    pub fn normalized_query(&self) -> String {
        self.query_text
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let req: RecommendationRequest =
            serde_json::from_str(r#"{"user_id": "u1", "query_text": "learn rust"}"#).unwrap();
        assert_eq!(req.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(req.engine_preference, EnginePreference::Auto);
        assert!((req.diversity_weight - 0.3).abs() < f64::EPSILON);
        assert_eq!(req.quality_threshold, 6);
    }

    #[test]
    fn test_rejects_missing_query_and_project() {
        let req = RecommendationRequest::new("u1", "   ");
        let err = req.validate().unwrap_err();
        assert!(matches!(err, RecommendError::InvalidRequest(_)));
    }

    #[test]
    fn test_rejects_user_id_that_would_span_cache_keys() {
        let req = RecommendationRequest::new("u1:extra", "learn rust");
        let err = req.validate().unwrap_err();
        assert!(matches!(err, RecommendError::InvalidRequest(msg) if msg.contains("user_id")));
    }

    #[test]
    fn test_accepts_project_without_query() {
        let req = RecommendationRequest::new("u1", "").with_project(ProjectId(3));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_accepts_query_and_project_together() {
        let req = RecommendationRequest::new("u1", "graphql").with_project(ProjectId(3));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_user() {
        let req = RecommendationRequest::new(" ", "rust");
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_max_results() {
        let req = RecommendationRequest::new("u1", "rust").with_max_results(0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_caps_max_results() {
        let req = RecommendationRequest::new("u1", "rust").with_max_results(500);
        assert_eq!(req.validate().unwrap().max_results, MAX_RESULTS_CAP);
    }

    #[test]
    fn test_rejects_out_of_range_diversity() {
        let mut req = RecommendationRequest::new("u1", "rust");
        req.diversity_weight = 1.5;
        assert!(req.validate().is_err());
        req.diversity_weight = f64::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_rejects_quality_threshold_above_ten() {
        let mut req = RecommendationRequest::new("u1", "rust");
        req.quality_threshold = 11;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_normalizes_technology_profile() {
        let req = RecommendationRequest::new("u1", " Learn  Rust ")
            .with_technologies(["Rust", "rust", " Tokio ", ""]);
        let normalized = req.validate().unwrap();
        assert_eq!(normalized.query_text, "Learn  Rust");
        assert_eq!(normalized.technology_profile, vec!["rust", "tokio"]);
        assert_eq!(normalized.normalized_query(), "learn rust");
    }

    #[test]
    fn test_engine_preference_parse() {
        assert_eq!("ML".parse::<EnginePreference>().unwrap(), EnginePreference::Ml);
        assert!("turbo".parse::<EnginePreference>().is_err());
    }
}
