//! Intent analysis: LLM classification with a keyword-heuristic fallback.

pub mod analyzer;
pub mod heuristic;
