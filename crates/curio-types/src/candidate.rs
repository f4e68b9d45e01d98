//! Candidate content items read from the external content repository.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::CandidateId;

/// Highest quality score the content pipeline assigns.
pub const MAX_QUALITY_SCORE: u8 = 10;

/// A saved content item eligible for recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    /// Title as saved by the user (used for reasons and keyword fallback).
    #[serde(default)]
    pub title: String,
    /// Fixed-dimension embedding, absent until the pipeline computes it.
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// Pipeline quality score, 0-10.
    pub quality_score: u8,
    /// Normalized technology tags.
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    /// Output of the content analysis pipeline. May be stale or absent.
    #[serde(default)]
    pub cached_analysis: Option<ContentAnalysis>,
    pub created_at: DateTime<Utc>,
}

impl Candidate {
    /// Quality score scaled to [0, 1].
    pub fn quality_ratio(&self) -> f64 {
        f64::from(self.quality_score.min(MAX_QUALITY_SCORE)) / f64::from(MAX_QUALITY_SCORE)
    }

    /// Whether the semantic engines can score this candidate.
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Technology tags unioned with the analysis key concepts (normalized).
    pub fn technology_signals(&self) -> BTreeSet<String> {
        let mut signals = self.technologies.clone();
        if let Some(analysis) = &self.cached_analysis {
            signals.extend(
                analysis
                    .key_concepts
                    .iter()
                    .map(|c| normalize_technology(c))
                    .filter(|c| !c.is_empty()),
            );
        }
        signals
    }
}

/// Result of the external content analysis pipeline for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub content_type: ContentType,
    #[serde(default)]
    pub difficulty_level: Option<DifficultyLevel>,
    #[serde(default)]
    pub key_concepts: Vec<String>,
}

/// Kind of content an item is, as classified by the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Tutorial,
    Article,
    Documentation,
    Course,
    Video,
    Repository,
    Library,
    Tool,
    Example,
    Paper,
    Discussion,
    #[serde(other)]
    Other,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Tutorial => "tutorial",
            ContentType::Article => "article",
            ContentType::Documentation => "documentation",
            ContentType::Course => "course",
            ContentType::Video => "video",
            ContentType::Repository => "repository",
            ContentType::Library => "library",
            ContentType::Tool => "tool",
            ContentType::Example => "example",
            ContentType::Paper => "paper",
            ContentType::Discussion => "discussion",
            ContentType::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Difficulty of a content item, also used for a user's inferred skill level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    /// Position on a 0..=2 scale.
    pub fn rank(self) -> u8 {
        match self {
            DifficultyLevel::Beginner => 0,
            DifficultyLevel::Intermediate => 1,
            DifficultyLevel::Advanced => 2,
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLevel::Beginner => write!(f, "beginner"),
            DifficultyLevel::Intermediate => write!(f, "intermediate"),
            DifficultyLevel::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "basic" | "easy" => Ok(DifficultyLevel::Beginner),
            "intermediate" | "medium" => Ok(DifficultyLevel::Intermediate),
            "advanced" | "expert" | "hard" => Ok(DifficultyLevel::Advanced),
            other => Err(format!("invalid difficulty level: '{other}'")),
        }
    }
}

/// Normalize a technology tag: trimmed, lowercased, inner whitespace collapsed to '-'.
///
/// "React Hooks" -> "react-hooks", " Rust " -> "rust".
pub fn normalize_technology(raw: &str) -> String {
    raw.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
