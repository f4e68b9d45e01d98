//! Skill-level inference for the difficulty-alignment signal.

use curio_types::candidate::DifficultyLevel;
use curio_types::intent::IntentType;

const ADVANCED_CUES: &[&str] = &[
    "advanced", "expert", "deep dive", "internals", "in depth", "in-depth", "optimiz",
    "performance tuning", "under the hood", "architecture",
];

const BEGINNER_CUES: &[&str] = &[
    "beginner", "basics", "basic", "intro", "getting started", "first steps", "for dummies",
    "from scratch", "101", "fundamentals", "newbie",
];

/// Infer the user's skill level from the request wording, else from intent.
pub fn infer_skill_level(query_text: &str, intent: IntentType) -> DifficultyLevel {
    let q = query_text.to_lowercase();
    if ADVANCED_CUES.iter().any(|c| q.contains(c)) {
        return DifficultyLevel::Advanced;
    }
    if BEGINNER_CUES.iter().any(|c| q.contains(c)) {
        return DifficultyLevel::Beginner;
    }
    match intent {
        IntentType::Learn => DifficultyLevel::Beginner,
        IntentType::Build | IntentType::Unknown => DifficultyLevel::Intermediate,
        IntentType::Research => DifficultyLevel::Advanced,
    }
}

/// 1 for an exact match, 0.5 one level apart, 0 two levels apart.
pub fn difficulty_alignment(content: DifficultyLevel, skill: DifficultyLevel) -> f64 {
    let distance = f64::from(content.rank().abs_diff(skill.rank()));
    1.0 - distance / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wording_overrides_intent() {
        assert_eq!(
            infer_skill_level("advanced react hooks patterns", IntentType::Learn),
            DifficultyLevel::Advanced
        );
        assert_eq!(
            infer_skill_level("rust basics", IntentType::Research),
            DifficultyLevel::Beginner
        );
    }

    #[test]
    fn test_intent_defaults() {
        assert_eq!(infer_skill_level("react hooks", IntentType::Learn), DifficultyLevel::Beginner);
        assert_eq!(infer_skill_level("auth", IntentType::Build), DifficultyLevel::Intermediate);
        assert_eq!(infer_skill_level("olap", IntentType::Research), DifficultyLevel::Advanced);
    }

    #[test]
    fn test_alignment() {
        use DifficultyLevel::*;
        assert_eq!(difficulty_alignment(Beginner, Beginner), 1.0);
        assert_eq!(difficulty_alignment(Intermediate, Beginner), 0.5);
        assert_eq!(difficulty_alignment(Advanced, Beginner), 0.0);
    }
}
