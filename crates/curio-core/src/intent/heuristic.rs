//! Keyword-heuristic intent classifier.
//!
//! Classifies by matching the request against static tables of
//! intent-indicative terms. No model, no IO, deterministic. Confidence is
//! capped at [`HEURISTIC_CONFIDENCE_CAP`].

use curio_types::candidate::normalize_technology;
use curio_types::intent::{
    HEURISTIC_CONFIDENCE_CAP, Intent, IntentSource, IntentType, ProjectContext,
};

/// Maximum number of keywords extracted from one request.
pub const MAX_KEYWORDS: usize = 12;

const LEARN_PREFIXES: &[&str] = &["how do i", "how to", "what is", "what are", "explain", "learn"];

const LEARN_TERMS: &[&str] = &[
    "learn", "learning", "tutorial", "tutorials", "understand", "understanding", "explain",
    "explained", "beginner", "beginners", "introduction", "intro", "guide", "basics",
    "course", "study", "getting started", "fundamentals", "lesson", "lessons", "how to",
    "concepts", "teach",
];

const BUILD_TERMS: &[&str] = &[
    "build", "building", "implement", "implementing", "implementation", "create", "creating",
    "develop", "developing", "setup", "set up", "integrate", "integrating", "integration",
    "deploy", "deploying", "fix", "debug", "boilerplate", "template", "starter", "example",
    "examples", "migrate", "migration", "add", "configure", "library", "sdk",
];

const RESEARCH_TERMS: &[&str] = &[
    "research", "compare", "comparison", "vs", "versus", "alternatives", "alternative",
    "evaluate", "evaluation", "benchmark", "benchmarks", "survey", "trends", "review",
    "pros and cons", "tradeoffs", "trade-offs", "state of", "paper", "papers", "analysis",
    "landscape", "best",
];

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "for", "to", "of", "in", "on", "with", "how", "do", "i",
    "what", "is", "are", "my", "me", "about", "using", "use", "want", "need", "into", "from",
    "this", "that", "it", "be", "can", "some", "should", "which", "when", "why", "we", "our",
    "your", "at", "by", "as", "get", "more", "better", "way", "ways", "good", "new", "up",
];

/// Lowercase, turn punctuation (other than `+ # . -`) into spaces and
/// collapse whitespace.
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '-') {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-word (or whole-phrase) containment.
fn has_term(padded: &str, term: &str) -> bool {
    padded.contains(&format!(" {term} "))
}

fn count_terms(padded: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| has_term(padded, t)).count()
}

fn starts_with_any(text: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| text.starts_with(p))
}

fn is_intent_term(token: &str) -> bool {
    LEARN_TERMS.contains(&token) || BUILD_TERMS.contains(&token) || RESEARCH_TERMS.contains(&token)
}

/// Topic keywords from the request text: everything that is neither a
/// stopword nor an intent-indicative term, in order of appearance.
pub fn extract_keywords(text: &str, context: Option<&ProjectContext>) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    let mut push = |kw: String| {
        if !kw.is_empty() && keywords.len() < MAX_KEYWORDS && !keywords.contains(&kw) {
            keywords.push(kw);
        }
    };

    for token in normalize(text).split(' ') {
        let token = token.trim_matches(|c| c == '.' || c == '-');
        if token.len() < 2 && !token.contains(['+', '#']) {
            continue;
        }
        if STOPWORDS.contains(&token) || is_intent_term(token) {
            continue;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        push(token.to_string());
    }

    if let Some(ctx) = context {
        for tech in &ctx.technologies {
            push(normalize_technology(tech));
        }
    }
    keywords
}

/// Classify `query` (or, if empty, the project context) into an intent.
pub fn classify(query: &str, context: Option<&ProjectContext>) -> Intent {
    let text = if query.trim().is_empty() {
        context.map(ProjectContext::as_text).unwrap_or_default()
    } else {
        query.to_string()
    };
    let normalized = normalize(&text);
    let keywords = extract_keywords(&text, context);

    if normalized.is_empty() {
        return Intent::unknown(IntentSource::HeuristicFallback);
    }
    let padded = format!(" {normalized} ");

    let mut learn = count_terms(&padded, LEARN_TERMS) as f64;
    if starts_with_any(&normalized, LEARN_PREFIXES) {
        learn += 1.0;
    }
    let mut build = count_terms(&padded, BUILD_TERMS) as f64;
    if context.is_some() {
        // Working inside a project leans toward building.
        build += 0.5;
    }
    let research = count_terms(&padded, RESEARCH_TERMS) as f64;

    let ranked = [
        (IntentType::Learn, learn),
        (IntentType::Build, build),
        (IntentType::Research, research),
    ];
    let (intent_type, best) = ranked
        .iter()
        .copied()
        .fold((IntentType::Unknown, 0.0_f64), |acc, (ty, score)| {
            if score > acc.1 { (ty, score) } else { acc }
        });

    if best <= 0.0 {
        return Intent {
            keywords,
            ..Intent::unknown(IntentSource::HeuristicFallback)
        };
    }

    let runner_up = ranked
        .iter()
        .filter(|(ty, _)| *ty != intent_type)
        .map(|(_, s)| *s)
        .fold(0.0_f64, f64::max);
    let margin = (best - runner_up) / best;
    let confidence = (0.2 + 0.3 * margin).min(HEURISTIC_CONFIDENCE_CAP);

    Intent {
        intent_type,
        confidence,
        keywords,
        source: IntentSource::HeuristicFallback,
    }
}
