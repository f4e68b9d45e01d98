//! Engine selection and the fallback chain.

use curio_types::intent::{Intent, IntentType};
use curio_types::recommendation::EngineKind;
use curio_types::request::EnginePreference;

/// Pick the primary engine for a request.
///
/// An explicit preference always wins. Under `auto` the intent decides:
/// build goes to Context-Aware, learn to ML-Enhanced when there is
/// interaction history (else Context-Aware), anything else to Fast-Semantic.
pub fn select_engine(preference: EnginePreference, intent: &Intent, has_history: bool) -> EngineKind {
    match preference {
        EnginePreference::Fast => EngineKind::FastSemantic,
        EnginePreference::Context => EngineKind::ContextAware,
        EnginePreference::Ml => EngineKind::MlEnhanced,
        EnginePreference::Auto => match intent.intent_type {
            IntentType::Build => EngineKind::ContextAware,
            IntentType::Learn if has_history => EngineKind::MlEnhanced,
            IntentType::Learn => EngineKind::ContextAware,
            IntentType::Research | IntentType::Unknown => EngineKind::FastSemantic,
        },
    }
}

/// Whether selecting for this request may need interaction history.
pub fn needs_history(preference: EnginePreference, intent: &Intent) -> bool {
    match preference {
        EnginePreference::Ml => true,
        EnginePreference::Auto => intent.intent_type == IntentType::Learn,
        EnginePreference::Fast | EnginePreference::Context => false,
    }
}

/// Engines to try in order: the selected one, then Context-Aware,
/// Fast-Semantic and finally BasicSimilarity, without repeats.
pub fn fallback_chain(selected: EngineKind) -> Vec<EngineKind> {
    let mut chain = vec![selected];
    for kind in [
        EngineKind::ContextAware,
        EngineKind::FastSemantic,
        EngineKind::BasicSimilarity,
    ] {
        if !chain.contains(&kind) {
            chain.push(kind);
        }
    }
    chain
}
