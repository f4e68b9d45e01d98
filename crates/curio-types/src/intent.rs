//! Intent derived from a recommendation request.
//!
//! An intent is computed once per request (by the LLM or the keyword
//! heuristic) and never persisted beyond the request, except as part of
//! the cached response.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Highest confidence the keyword heuristic may report.
pub const HEURISTIC_CONFIDENCE_CAP: f64 = 0.5;

/// The inferred purpose behind a user's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    Learn,
    Build,
    Research,
    Unknown,
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentType::Learn => write!(f, "learn"),
            IntentType::Build => write!(f, "build"),
            IntentType::Research => write!(f, "research"),
            IntentType::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for IntentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "learn" | "learning" => Ok(IntentType::Learn),
            "build" | "building" => Ok(IntentType::Build),
            "research" | "researching" => Ok(IntentType::Research),
            "unknown" => Ok(IntentType::Unknown),
            other => Err(format!("invalid intent type: '{other}'")),
        }
    }
}

/// Which classifier produced an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentSource {
    Llm,
    HeuristicFallback,
}

impl fmt::Display for IntentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentSource::Llm => write!(f, "llm"),
            IntentSource::HeuristicFallback => write!(f, "heuristic-fallback"),
        }
    }
}

/// Classified intent plus the technology/topic keywords extracted from the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    /// Confidence in [0, 1]. Capped at [`HEURISTIC_CONFIDENCE_CAP`] for the heuristic.
    pub confidence: f64,
    /// Ordered, de-duplicated keywords.
    pub keywords: Vec<String>,
    pub source: IntentSource,
}

impl Intent {
    /// The intent used when nothing could be inferred.
    pub fn unknown(source: IntentSource) -> Self {
        Self {
            intent_type: IntentType::Unknown,
            confidence: 0.0,
            keywords: Vec::new(),
            source,
        }
    }
}

/// Project/task context supplied alongside (or instead of) a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    /// Title of the task the user is working on, if one was given.
    #[serde(default)]
    pub task_title: Option<String>,
}

impl ProjectContext {
    /// Flatten the context into text suitable for classification or embedding.
    pub fn as_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.title.as_str()];
        if !self.description.is_empty() {
            parts.push(self.description.as_str());
        }
        if let Some(task) = &self.task_title {
            parts.push(task.as_str());
        }
        let techs = self.technologies.join(" ");
        let mut text = parts.join(". ");
        if !techs.is_empty() {
            text.push_str(". ");
            text.push_str(&techs);
        }
        text
    }
}
