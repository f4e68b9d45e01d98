//! API-key value types.
//!
//! Decrypted keys only ever live inside [`Redacted`] so they cannot end up
//! in logs through `Debug` or `Display`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;
use crate::quota::KeySource;

/// A wrapper that redacts secret values in Debug and Display output.
#[derive(Clone)]
pub struct Redacted(String);

impl Redacted {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying secret value. Keep the borrow short-lived.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked representation with the last 4 characters visible.
    pub fn masked(&self) -> String {
        let count = self.0.chars().count();
        if count <= 4 {
            return "****".to_string();
        }
        let tail: String = self.0.chars().skip(count - 4).collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Redacted(\"***\")")
    }
}

impl fmt::Display for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

/// A decrypted key paired with where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedApiKey {
    pub key: Redacted,
    pub source: KeySource,
}

/// Metadata about a stored user key (the value itself is never in this struct).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    pub user_id: UserId,
    /// Last four characters, for display.
    pub masked: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
