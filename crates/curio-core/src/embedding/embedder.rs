//! Embedder trait for text-to-vector conversion.
//!
//! Implementations (e.g., the local fastembed model) live in curio-infra.

use curio_types::error::RepositoryError;

/// Trait for converting text into embedding vectors.
///
/// Must be safe to call concurrently; the model is loaded once per process
/// and shared read-only across requests.
pub trait Embedder: Send + Sync {
    /// Embed one or more texts. Returns one vector per input text.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, RepositoryError>> + Send;

    /// The model name used for embeddings (e.g., "bge-small-en-v1.5").
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
