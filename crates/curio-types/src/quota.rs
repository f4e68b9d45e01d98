//! Per-user LLM quota types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// A fixed time bucket over which outbound LLM calls are capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaWindow {
    Minute,
    Day,
    Month,
}

impl QuotaWindow {
    pub const ALL: [QuotaWindow; 3] = [QuotaWindow::Minute, QuotaWindow::Day, QuotaWindow::Month];
}

impl fmt::Display for QuotaWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaWindow::Minute => write!(f, "minute"),
            QuotaWindow::Day => write!(f, "day"),
            QuotaWindow::Month => write!(f, "month"),
        }
    }
}

/// Which API key an outbound call is billed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    /// The user's own (encrypted at rest) key.
    User,
    /// The operator's shared fallback key, under a coarser quota.
    SharedFallback,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::User => write!(f, "user"),
            KeySource::SharedFallback => write!(f, "shared"),
        }
    }
}

/// Call limits for the three windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    pub per_minute: u64,
    pub per_day: u64,
    pub per_month: u64,
}

impl QuotaLimits {
    pub fn for_window(&self, window: QuotaWindow) -> u64 {
        match window {
            QuotaWindow::Minute => self.per_minute,
            QuotaWindow::Day => self.per_day,
            QuotaWindow::Month => self.per_month,
        }
    }
}

/// Usage of one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowUsage {
    pub window: QuotaWindow,
    pub used: u64,
    pub limit: u64,
    /// Instant the window's counter resets to zero.
    pub resets_at: DateTime<Utc>,
}

impl WindowUsage {
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}

/// Snapshot of a user's quota, for surfacing in a UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    pub user_id: UserId,
    pub key_source: KeySource,
    pub minute: WindowUsage,
    pub day: WindowUsage,
    pub month: WindowUsage,
}

impl QuotaState {
    pub fn windows(&self) -> [&WindowUsage; 3] {
        [&self.minute, &self.day, &self.month]
    }
}

/// Outcome of a `check_and_reserve` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// Seconds until the nearest exhausted window resets; 0 when allowed.
    pub retry_after_seconds: u64,
    pub key_source: KeySource,
}

impl QuotaDecision {
    pub fn allow(key_source: KeySource) -> Self {
        Self {
            allowed: true,
            retry_after_seconds: 0,
            key_source,
        }
    }

    pub fn deny(key_source: KeySource, retry_after_seconds: u64) -> Self {
        Self {
            allowed: false,
            retry_after_seconds,
            key_source,
        }
    }
}
