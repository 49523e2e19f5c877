//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that maps a text string to a fixed-dimension vector.
///
/// Ingestion and retrieval must use the same provider; mixing embedding
/// models breaks similarity semantics. The pipeline embeds each chunk with
/// an independent call, so implementations need no batch entry point.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// The dimensionality of embeddings produced by this provider.
    ///
    /// Must match the vector index's configured dimensionality or all
    /// upserts and queries fail.
    fn dimensions(&self) -> usize;
}
