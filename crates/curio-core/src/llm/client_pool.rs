//! Bounded per-user pool of constructed LLM clients.
//!
//! Entries are evicted after `idle_ttl` without use, and the least recently
//! used entry is dropped when the pool is full.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use curio_types::identity::UserId;
use curio_types::llm::LlmError;
use curio_types::quota::KeySource;

use super::box_provider::BoxLlmProvider;

#[derive(Debug)]
struct PoolEntry {
    client: Arc<BoxLlmProvider>,
    source: KeySource,
    last_used: Instant,
}

#[derive(Debug)]
pub struct ClientPool {
    entries: Mutex<HashMap<UserId, PoolEntry>>,
    capacity: usize,
    idle_ttl: Duration,
}

impl ClientPool {
    pub fn new(capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            idle_ttl,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, PoolEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the user's cached client, building one with `build` on a miss.
    ///
    /// A cached client built for a different key source is replaced, so a
    /// user who adds their own key stops using the shared one.
    pub fn get_or_build<B>(
        &self,
        user_id: &UserId,
        source: KeySource,
        build: B,
    ) -> Result<Arc<BoxLlmProvider>, LlmError>
    where
        B: FnOnce() -> Result<BoxLlmProvider, LlmError>,
    {
        let now = Instant::now();
        let mut entries = self.lock();

        if let Some(entry) = entries.get_mut(user_id) {
            if entry.source == source && now.duration_since(entry.last_used) < self.idle_ttl {
                entry.last_used = now;
                return Ok(Arc::clone(&entry.client));
            }
        }

        let client = Arc::new(build()?);
        entries.insert(
            user_id.clone(),
            PoolEntry {
                client: Arc::clone(&client),
                source,
                last_used: now,
            },
        );
        self.evict(&mut entries, now);
        Ok(client)
    }

    fn evict(&self, entries: &mut HashMap<UserId, PoolEntry>, now: Instant) {
        let idle_ttl = self.idle_ttl;
        entries.retain(|_, e| now.duration_since(e.last_used) < idle_ttl || e.last_used == now);

        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    tracing::debug!(user_id = %key, "evicting LRU LLM client");
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Drop a user's client (after a key change or an auth failure).
    pub fn remove(&self, user_id: &UserId) -> bool {
        self.lock().remove(user_id).is_some()
    }

    /// Drop every client idle longer than the TTL. Returns how many went.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| now.duration_since(e.last_used) < self.idle_ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
