//! Per-user preference profile folded from interaction history.
//!
//! Each interaction adds its kind's signal (completed > saved > opened,
//! dismissed negative) to every technology it carries and to its content
//! type. Affinities are normalized to [-1, 1] by the largest magnitude.

use std::collections::HashMap;

use curio_types::candidate::{Candidate, ContentType};
use curio_types::config::PersonalizationBounds;
use curio_types::interaction::Interaction;

const TECHNOLOGY_SHARE: f64 = 0.7;
const CONTENT_TYPE_SHARE: f64 = 0.3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalizationProfile {
    technologies: HashMap<String, f64>,
    content_types: HashMap<ContentType, f64>,
    interactions: usize,
}

fn normalize_in_place<K>(map: &mut HashMap<K, f64>) {
    let max = map.values().fold(0.0_f64, |m, v| m.max(v.abs()));
    if max > 0.0 {
        for v in map.values_mut() {
            *v /= max;
        }
    }
}

impl PersonalizationProfile {
    pub fn from_interactions(history: &[Interaction]) -> Self {
        let mut technologies: HashMap<String, f64> = HashMap::new();
        let mut content_types: HashMap<ContentType, f64> = HashMap::new();

        for interaction in history {
            let signal = interaction.kind.signal();
            for tech in &interaction.technologies {
                *technologies.entry(tech.clone()).or_default() += signal;
            }
            if let Some(ct) = interaction.content_type {
                *content_types.entry(ct).or_default() += signal;
            }
        }

        normalize_in_place(&mut technologies);
        normalize_in_place(&mut content_types);

        Self {
            technologies,
            content_types,
            interactions: history.len(),
        }
    }

    /// Whether there is any history to personalize from.
    pub fn is_empty(&self) -> bool {
        self.interactions == 0
    }

    pub fn technology_affinity(&self, tech: &str) -> Option<f64> {
        self.technologies.get(tech).copied()
    }

    /// Combined affinity of the user for `candidate`, in [-1, 1].
    pub fn affinity(&self, candidate: &Candidate) -> f64 {
        let known: Vec<f64> = candidate
            .technology_signals()
            .iter()
            .filter_map(|t| self.technologies.get(t).copied())
            .collect();
        let tech = if known.is_empty() {
            0.0
        } else {
            known.iter().sum::<f64>() / known.len() as f64
        };

        let content_type = candidate
            .cached_analysis
            .as_ref()
            .and_then(|a| self.content_types.get(&a.content_type).copied())
            .unwrap_or(0.0);

        (TECHNOLOGY_SHARE * tech + CONTENT_TYPE_SHARE * content_type).clamp(-1.0, 1.0)
    }

    /// Multiplier in `[bounds.min_factor, bounds.max_factor]`; 1.0 when the
    /// profile is empty or the candidate is neutral.
    pub fn factor(&self, candidate: &Candidate, bounds: &PersonalizationBounds) -> f64 {
        if self.is_empty() {
            return 1.0;
        }
        let affinity = self.affinity(candidate);
        let factor = if affinity >= 0.0 {
            1.0 + (bounds.max_factor - 1.0) * affinity
        } else {
            1.0 + (1.0 - bounds.min_factor) * affinity
        };
        factor.clamp(bounds.min_factor, bounds.max_factor)
    }
}
