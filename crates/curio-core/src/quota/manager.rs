//! QuotaManager: atomic per-user reservation across three fixed windows.
//!
//! Each window is a counter keyed `quota:{scope}:{user}:{window}:{bucket}`
//! in a [`CounterStore`]. A reservation increments all three counters; if
//! any post-increment value exceeds its limit every increment is rolled
//! back and the call is denied. Because the check reads the value returned
//! by the increment itself, two concurrent reservations can never both pass
//! when only one slot remains.

use std::sync::Arc;
use std::time::Duration;

use curio_types::config::QuotaConfig;
use curio_types::error::QuotaError;
use curio_types::identity::UserId;
use curio_types::quota::{
    KeySource, QuotaDecision, QuotaLimits, QuotaState, QuotaWindow, WindowUsage,
};

use super::clock::{Clock, SystemClock};
use super::window::{bucket, seconds_until};
use crate::repository::counter::CounterStore;

pub struct QuotaManager<Q: CounterStore> {
    store: Q,
    config: QuotaConfig,
    clock: Arc<dyn Clock>,
}

impl<Q: CounterStore> QuotaManager<Q> {
    pub fn new(store: Q, config: QuotaConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Q, config: QuotaConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn limits(&self, source: KeySource) -> QuotaLimits {
        match source {
            KeySource::User => self.config.user,
            KeySource::SharedFallback => self.config.shared,
        }
    }

    fn counter_key(user_id: &UserId, source: KeySource, window: QuotaWindow, bucket: &str) -> String {
        format!("quota:{source}:{user_id}:{window}:{bucket}")
    }

    /// Reserve one call for `user_id` against the quota of `source`.
    #[tracing::instrument(skip_all, fields(user_id = %user_id, key_source = %source))]
    pub async fn check_and_reserve(
        &self,
        user_id: &UserId,
        source: KeySource,
    ) -> Result<QuotaDecision, QuotaError> {
        let now = self.clock.now();
        let limits = self.limits(source);

        let mut reserved: Vec<String> = Vec::with_capacity(QuotaWindow::ALL.len());
        let mut retry_after: Option<u64> = None;

        for window in QuotaWindow::ALL {
            let (bucket_id, resets_at) = bucket(window, now);
            let key = Self::counter_key(user_id, source, window, &bucket_id);
            let ttl = Duration::from_secs(seconds_until(resets_at, now));

            let count = match self.store.incr_with_expiry(&key, ttl).await {
                Ok(count) => count,
                Err(e) => {
                    self.rollback(&reserved).await;
                    return Err(e);
                }
            };
            reserved.push(key);

            if count > limits.for_window(window) {
                let wait = seconds_until(resets_at, now);
                retry_after = Some(retry_after.map_or(wait, |r| r.min(wait)));
            }
        }

        match retry_after {
            Some(wait) => {
                self.rollback(&reserved).await;
                tracing::info!(retry_after_seconds = wait, "quota exhausted");
                Ok(QuotaDecision::deny(source, wait))
            }
            None => Ok(QuotaDecision::allow(source)),
        }
    }

    async fn rollback(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.store.decr(key).await {
                tracing::warn!(key = %key, error = %e, "failed to roll back quota reservation");
            }
        }
    }

    /// Current usage of every window for `user_id` under `source`.
    pub async fn status(&self, user_id: &UserId, source: KeySource) -> Result<QuotaState, QuotaError> {
        let now = self.clock.now();
        let limits = self.limits(source);

        let mut usage = Vec::with_capacity(3);
        for window in QuotaWindow::ALL {
            let (bucket_id, resets_at) = bucket(window, now);
            let key = Self::counter_key(user_id, source, window, &bucket_id);
            let used = self.store.get(&key).await?;
            usage.push(WindowUsage {
                window,
                used,
                limit: limits.for_window(window),
                resets_at,
            });
        }

        let mut usage = usage.into_iter();
        match (usage.next(), usage.next(), usage.next()) {
            (Some(minute), Some(day), Some(month)) => Ok(QuotaState {
                user_id: user_id.clone(),
                key_source: source,
                minute,
                day,
                month,
            }),
            _ => Err(QuotaError::StoreUnavailable(
                "incomplete window usage".to_string(),
            )),
        }
    }
}
