//! Similarity primitives shared by the engines.

use std::collections::BTreeSet;

/// Cosine similarity clamped to [0, 1].
///
/// Returns 0 for empty, zero-norm or dimension-mismatched vectors.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_finite() { sim.clamp(0.0, 1.0) } else { 0.0 }
}

/// Jaccard similarity |A ∩ B| / |A ∪ B|; 0 if either side is empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Number of tags two sets share.
pub fn shared_count(a: &BTreeSet<String>, b: &BTreeSet<String>) -> usize {
    a.intersection(b).count()
}

/// Lowercased alphanumeric tokens of `text` (length >= 2).
pub fn tokens(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .filter(|t| t.len() >= 2)
        .map(str::to_string)
        .collect()
}

/// Fraction of `keywords` found in `haystack` tokens (0 if no keywords).
///
/// A multi-word keyword counts when all of its tokens are present.
pub fn keyword_coverage(keywords: &[String], haystack: &BTreeSet<String>) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let hits = keywords
        .iter()
        .filter(|kw| {
            let parts = tokens(kw);
            !parts.is_empty() && parts.iter().all(|p| haystack.contains(p))
        })
        .count();
    hits as f64 / keywords.len() as f64
}
