//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `curio-core` using fastembed's
//! BGESmallENV15 model (384 dimensions) with ONNX runtime inference. The
//! model is loaded once and shared; inference runs on the blocking pool.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};

use curio_core::embedding::embedder::Embedder;
use curio_types::error::RepositoryError;

const MODEL_NAME: &str = "bge-small-en-v1.5";
const DIMENSION: usize = 384;

/// Local embedder. Cloning shares the loaded model.
#[derive(Clone)]
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedder {
    /// Load (downloading on first use) the model into `cache_dir`.
    ///
    /// Blocking: call from `spawn_blocking` or before the runtime is busy.
    pub fn new(cache_dir: PathBuf) -> Result<Self, RepositoryError> {
        let options = TextInitOptions::new(EmbeddingModel::BGESmallENV15)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)
            .map_err(|e| RepositoryError::Query(format!("failed to load embedding model: {e}")))?;
        tracing::info!(model = MODEL_NAME, "embedding model loaded");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model", &MODEL_NAME)
            .finish()
    }
}

impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            model
                .embed(texts, None)
                .map_err(|e| RepositoryError::Query(format!("embedding failed: {e}")))
        })
        .await
        .map_err(|e| RepositoryError::Query(format!("embedding task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}
