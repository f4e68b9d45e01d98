//! Past user interactions with saved content, used for personalization.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::ContentType;
use crate::identity::CandidateId;

/// What the user did with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Saved,
    Opened,
    Completed,
    Dismissed,
}

impl InteractionKind {
    /// Signed preference signal carried by one interaction of this kind.
    pub fn signal(self) -> f64 {
        match self {
            InteractionKind::Saved => 1.0,
            InteractionKind::Opened => 0.5,
            InteractionKind::Completed => 2.0,
            InteractionKind::Dismissed => -2.0,
        }
    }
}

/// One recorded interaction, denormalized with the item's tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub candidate_id: CandidateId,
    pub kind: InteractionKind,
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dismissed_is_negative() {
        assert!(InteractionKind::Dismissed.signal() < 0.0);
        assert!(InteractionKind::Completed.signal() > InteractionKind::Saved.signal());
    }

    #[test]
    fn test_interaction_deserialize_defaults() {
        let json = r#"{"candidate_id": 7, "kind": "completed", "occurred_at": "2026-01-02T03:04:05Z"}"#;
        let interaction: Interaction = serde_json::from_str(json).unwrap();
        assert_eq!(interaction.candidate_id, CandidateId(7));
        assert_eq!(interaction.kind, InteractionKind::Completed);
        assert!(interaction.technologies.is_empty());
        assert!(interaction.content_type.is_none());
    }
}
