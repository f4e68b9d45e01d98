//! CachingEmbedder: bounded text -> vector cache in front of an embedder.
//!
//! Every provider failure, including a timeout, surfaces as
//! `EngineError::EmbeddingUnavailable` so the engines can fall back.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use curio_types::error::EngineError;

use super::box_embedder::BoxEmbedder;

pub struct CachingEmbedder {
    inner: BoxEmbedder,
    cache: DashMap<String, Arc<Vec<f32>>>,
    capacity: usize,
    timeout: Duration,
}

impl CachingEmbedder {
    pub fn new(inner: BoxEmbedder, capacity: usize, timeout: Duration) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            capacity: capacity.max(1),
            timeout,
        }
    }

    /// Embed a single text, serving repeats from the cache.
    pub async fn embed_one(&self, text: &str) -> Result<Arc<Vec<f32>>, EngineError> {
        let key = text.trim().to_lowercase();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }

        let input = [key.clone()];
        let vectors = match tokio::time::timeout(self.timeout, self.inner.embed(&input)).await {
            Ok(Ok(vectors)) => vectors,
            Ok(Err(e)) => return Err(EngineError::EmbeddingUnavailable(e.to_string())),
            Err(_) => {
                return Err(EngineError::EmbeddingUnavailable(format!(
                    "embedding timed out after {}ms",
                    self.timeout.as_millis()
                )));
            }
        };

        let vector = vectors
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EngineError::EmbeddingUnavailable("provider returned no vector".to_string()))?;
        let vector = Arc::new(vector);

        if self.cache.len() >= self.capacity {
            let victim = self.cache.iter().next().map(|e| e.key().clone());
            if let Some(victim) = victim {
                self.cache.remove(&victim);
            }
        }
        self.cache.insert(key, Arc::clone(&vector));
        Ok(vector)
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
