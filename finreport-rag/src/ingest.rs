//! Ingestion pipeline: extract → normalize → chunk → embed → upsert.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::chunking::{RecursiveTokenChunker, normalize_whitespace};
use crate::config::UPSERT_BATCH_SIZE;
use crate::document::{ChunkMetadata, DocumentMeta, VectorRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extract::TextExtractor;
use crate::index::VectorIndex;

/// The outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// The ID under which the document's chunks were stored.
    pub document_id: String,
    /// Number of chunks produced and upserted.
    pub chunk_count: usize,
}

/// Composes the extractor, chunker, embedder, and index into the document
/// ingestion workflow.
///
/// All collaborators are constructed once at process start and shared via
/// `Arc`; the pipeline itself holds no mutable state.
pub struct IngestionPipeline {
    extractor: Arc<dyn TextExtractor>,
    chunker: RecursiveTokenChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl IngestionPipeline {
    /// Create a new pipeline from its collaborators.
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        chunker: RecursiveTokenChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self { extractor, chunker, embedder, index }
    }

    /// Ingest one document file for a user.
    ///
    /// When `document_id` is `None` it is derived deterministically as
    /// `doc_{filename}_{user_id}`; re-uploading the same filename for the
    /// same user overwrites the prior chunks sharing a chunk index. This is
    /// the accepted idempotent-overwrite contract, not a bug.
    ///
    /// # Errors
    ///
    /// Any stage failure aborts the ingestion. Vectors upserted by earlier
    /// batches of the same call are not cleaned up; chunk IDs are
    /// deterministic, so a retried ingestion fully re-upserts them.
    pub async fn ingest(
        &self,
        file_path: &Path,
        user_id: &str,
        filename: &str,
        document_id: Option<&str>,
    ) -> Result<IngestReport> {
        let started = Instant::now();
        info!(filename, user_id, "starting ingestion");

        // 1. Extract raw text off the async runtime.
        let extractor = Arc::clone(&self.extractor);
        let path = file_path.to_owned();
        let raw_text = tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| RagError::Extraction(format!("extraction task failed: {e}")))??;

        // 2. Normalize whitespace.
        let text = normalize_whitespace(&raw_text);

        // 3. Chunk into overlapping token-bounded segments.
        let chunks = self.chunker.split(&text);

        // 4. Derive the document ID.
        let document_id = match document_id {
            Some(id) => id.to_string(),
            None => format!("doc_{filename}_{user_id}"),
        };

        if chunks.is_empty() {
            info!(document_id, chunk_count = 0, "ingested document (no text)");
            return Ok(IngestReport { document_id, chunk_count: 0 });
        }

        let meta = DocumentMeta::upload(user_id, filename);
        let total_chunks = chunks.len();

        // 5. Embed each chunk independently and build its vector record.
        let mut records = Vec::with_capacity(total_chunks);
        for (chunk_index, chunk_text) in chunks.into_iter().enumerate() {
            let embedding = self.embedder.embed(&chunk_text).await.map_err(|e| {
                error!(document_id, chunk_index, error = %e, "embedding failed during ingestion");
                e
            })?;

            records.push(VectorRecord {
                id: VectorRecord::chunk_id(&document_id, chunk_index),
                values: embedding,
                metadata: ChunkMetadata {
                    user_id: meta.user_id.clone(),
                    filename: meta.filename.clone(),
                    source: meta.source.clone(),
                    document_type: meta.document_type.clone(),
                    document_id: document_id.clone(),
                    chunk_index,
                    text: chunk_text,
                    total_chunks,
                },
            });
        }

        // 6. Upsert in batches; a failed batch aborts the whole ingestion.
        for (batch_number, batch) in records.chunks(UPSERT_BATCH_SIZE).enumerate() {
            self.index.upsert(batch).await.map_err(|e| {
                error!(document_id, batch_number, error = %e, "upsert failed during ingestion");
                e
            })?;
        }

        info!(
            document_id,
            chunk_count = total_chunks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ingested document"
        );

        Ok(IngestReport { document_id, chunk_count: total_chunks })
    }
}
