//! BoxEmbedder: type-erased [`Embedder`] for the recommender.
//!
//! `Embedder` uses RPITIT and cannot be a trait object, so `EmbedderDyn`
//! boxes the future and is blanket-implemented for every `Embedder`.
//! The wrapper also checks the shape of what the model returns: one vector
//! per input, each of the advertised dimension. Cosine similarity against a
//! vector of the wrong length would silently score 0.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use curio_types::error::RepositoryError;

use super::embedder::Embedder;

type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RepositoryError>> + Send + 'a>>;

/// Object-safe mirror of [`Embedder`].
pub trait EmbedderDyn: Send + Sync {
    fn embed_boxed<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a>;
    fn model_name_dyn(&self) -> &str;
    fn dimension_dyn(&self) -> usize;
}

impl<T: Embedder> EmbedderDyn for T {
    fn embed_boxed<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a> {
        Box::pin(self.embed(texts))
    }

    fn model_name_dyn(&self) -> &str {
        self.model_name()
    }

    fn dimension_dyn(&self) -> usize {
        self.dimension()
    }
}

pub struct BoxEmbedder {
    inner: Box<dyn EmbedderDyn>,
}

impl BoxEmbedder {
    pub fn new<T: Embedder + 'static>(embedder: T) -> Self {
        Self {
            inner: Box::new(embedder),
        }
    }

    /// Embed `texts`, rejecting output that doesn't match the input count
    /// or the model dimension.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        let vectors = self.inner.embed_boxed(texts).await?;
        if vectors.len() != texts.len() {
            return Err(RepositoryError::Query(format!(
                "{} returned {} vectors for {} texts",
                self.model_name(),
                vectors.len(),
                texts.len()
            )));
        }
        let expected = self.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(RepositoryError::Query(format!(
                "{} returned a {}-dimensional vector, expected {expected}",
                self.model_name(),
                bad.len()
            )));
        }
        Ok(vectors)
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name_dyn()
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension_dyn()
    }
}

impl fmt::Debug for BoxEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxEmbedder")
            .field("model", &self.model_name())
            .field("dimension", &self.dimension())
            .finish()
    }
}
