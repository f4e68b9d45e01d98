//! Identifiers for the entities the recommender references.
//!
//! Users come from the surrounding authentication layer and are opaque
//! strings. Projects, tasks and content items are numeric ids owned by the
//! external content repository.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Opaque user identifier supplied by the API layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject ids that are empty or contain `:` or `*`, which delimit and
    /// glob-match the cache keys built from them.
    pub fn check(&self) -> Result<(), String> {
        if self.0.trim().is_empty() {
            return Err("user_id is required".to_string());
        }
        if self.0.contains([':', '*']) {
            return Err(format!("user_id must not contain ':' or '*', got {:?}", self.0));
        }
        Ok(())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

macro_rules! numeric_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

numeric_id!(
    /// Identifier of a saved content item (bookmark, repo, tutorial).
    CandidateId
);
numeric_id!(
    /// Identifier of a user project in the content repository.
    ProjectId
);
numeric_id!(
    /// Identifier of a task inside a project.
    TaskId
);
