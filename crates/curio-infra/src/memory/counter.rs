//! Quota counters held in a concurrent map.

use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use tokio::time::Instant;

use curio_core::repository::counter::CounterStore;
use curio_types::error::QuotaError;

#[derive(Debug, Clone, Copy)]
struct Counter {
    value: u64,
    expires_at: Instant,
}

/// [`CounterStore`] over a `DashMap`.
///
/// Increments hold the shard lock for the key, so concurrent callers always
/// observe distinct post-increment values.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, Counter>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, QuotaError> {
        let now = Instant::now();
        let fresh = Counter {
            value: 1,
            expires_at: now + ttl,
        };
        let value = match self.counters.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                let counter = occupied.get_mut();
                if counter.expires_at <= now {
                    *counter = fresh;
                } else {
                    counter.value += 1;
                }
                counter.value
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(fresh);
                1
            }
        };
        Ok(value)
    }

    async fn decr(&self, key: &str) -> Result<u64, QuotaError> {
        let now = Instant::now();
        let value = match self.counters.get_mut(key) {
            Some(mut counter) if counter.expires_at > now => {
                counter.value = counter.value.saturating_sub(1);
                counter.value
            }
            _ => 0,
        };
        Ok(value)
    }

    async fn get(&self, key: &str) -> Result<u64, QuotaError> {
        let now = Instant::now();
        Ok(self
            .counters
            .get(key)
            .filter(|c| c.expires_at > now)
            .map(|c| c.value)
            .unwrap_or(0))
    }
}
