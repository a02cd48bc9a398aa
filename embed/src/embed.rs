use crate::error::EmbedError;

/// Embedder converts text into L2-normalized dense float32 vectors.
///
/// Implementations must be safe for concurrent use (Send + Sync) and are
/// expected to be constructed once per process and shared by reference;
/// backend initialization dominates the cost of everything else.
///
/// Empty or whitespace-only input maps to a deterministic vector defined
/// by the backend, never to an error.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Return the embedding vector for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Return embedding vectors for multiple texts, one per input, in
    /// input order. Implementations may split large batches into smaller
    /// backend calls.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Return the dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
