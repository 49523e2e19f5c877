//! Vector index trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{ScoredMatch, VectorRecord};
use crate::error::Result;

/// Metadata filter applied to every index query.
///
/// Per-user data isolation is enforced here, at the index-query layer;
/// there is no separate application authorization layer. A missing or
/// incorrect `user_id` silently returns no (or wrong) results rather than
/// erroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    /// Required owner of the matched chunks.
    pub user_id: String,
    /// Optional restriction to a single document.
    pub document_id: Option<String>,
}

impl QueryFilter {
    /// Filter for all of a user's documents.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), document_id: None }
    }

    /// Restrict the filter to a single document.
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Whether a record's metadata passes this filter.
    pub fn matches(&self, metadata: &crate::document::ChunkMetadata) -> bool {
        metadata.user_id == self.user_id
            && self.document_id.as_deref().is_none_or(|doc| metadata.document_id == doc)
    }
}

/// A namespace-free key-vector store with metadata-filtered similarity search.
///
/// Record IDs are deterministic per chunk, so upserting is idempotent:
/// re-ingesting a document overwrites its prior records (last write wins;
/// no transaction primitive governs concurrent writers).
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Verify the index exists with the expected dimensionality, creating
    /// it (cosine metric) if absent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`](crate::error::RagError::Config) if an
    /// existing index has mismatched dimensionality. This is fatal and must
    /// not be worked around; the index has to be recreated externally.
    async fn ensure_ready(&self, dimensions: usize) -> Result<()>;

    /// Upsert records into the index. Records with known IDs are replaced.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Approximate-nearest-neighbor query, restricted by `filter`.
    ///
    /// Returns at most `top_k` matches ordered by descending similarity.
    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &QueryFilter,
    ) -> Result<Vec<ScoredMatch>>;
}
