//! The Embedding port — turns chunk text into vectors.

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts in one call. Callers are responsible for
    /// respecting [`crate::constants::EMBED_BATCH_MAX`]; providers may reject
    /// oversized batches with [`crate::error::Error::Embedding`].
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of vectors this provider returns, used to size the
    /// vector store collection up front.
    fn dimensions(&self) -> usize;
}
